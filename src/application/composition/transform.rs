use image::imageops::FilterType;
use tracing::debug;

use super::context::CompositionContext;
use super::geometry::crop_region;
use super::stage::StageErrorKind;
use super::working::WorkingImage;

pub(super) fn crop(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
) -> Result<(), StageErrorKind> {
    let region = crop_region(
        (working.width(), working.height()),
        (ctx.width, ctx.height),
        ctx.zoom,
        ctx.offset,
    );
    debug!(?region, zoom = ctx.zoom, "cropping background");
    working.image = working
        .image
        .crop_imm(region.x, region.y, region.width, region.height);
    Ok(())
}

/// Scale the crop to exactly the preview size
pub(super) fn resize(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
) -> Result<(), StageErrorKind> {
    if working.width() == 0 || working.height() == 0 {
        return Err(StageErrorKind::Failed("nothing left to resize".to_string()));
    }

    let follow_height =
        (working.height() as f64 * ctx.width as f64 / working.width() as f64).round() as i64;
    if (follow_height - ctx.height as i64).abs() > 1 {
        debug!(
            computed = follow_height,
            target = ctx.height,
            "crop aspect drifted from preview, snapping height"
        );
    }

    working.image = working
        .image
        .resize_exact(ctx.width, ctx.height, FilterType::Lanczos3);
    Ok(())
}

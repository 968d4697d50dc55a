use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::context::{BorderKind, BorderSpec, CompositionContext};
use super::geometry::auto_border_thickness;
use super::raster::{fill_rect, to_rgba};
use super::stage::StageErrorKind;
use super::working::WorkingImage;
use crate::application::ports::AssetSource;
use crate::domain::value_objects::HexColor;

pub const DEFAULT_FIXED_BORDER: u32 = 10;

/// Frame thickness in pixels; zero for `none`
pub fn border_thickness(spec: &BorderSpec, width: u32, height: u32) -> u32 {
    let thickness = match spec.kind {
        BorderKind::None => 0,
        BorderKind::Fixed => spec.width.unwrap_or(DEFAULT_FIXED_BORDER),
        BorderKind::Auto => auto_border_thickness(width, height),
    };
    thickness.min(width.min(height) / 2)
}

pub(super) fn add_border(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    assets: &dyn AssetSource,
) -> Result<(), StageErrorKind> {
    if ctx.border.kind == BorderKind::None {
        return Ok(());
    }

    let frame = match &ctx.border.asset {
        Some(reference) => Some(load_frame(assets, reference, working.width(), working.height())?),
        None => None,
    };
    let thickness = border_thickness(&ctx.border, working.width(), working.height());
    let color = to_rgba(ctx.border.color.unwrap_or(HexColor::WHITE));

    working.with_canvas(|canvas| match &frame {
        Some(frame) => imageops::overlay(canvas, frame, 0, 0),
        None => draw_frame(canvas, thickness, color),
    });
    Ok(())
}

fn load_frame(
    assets: &dyn AssetSource,
    reference: &str,
    width: u32,
    height: u32,
) -> Result<RgbaImage, StageErrorKind> {
    let bytes = assets
        .load(reference)
        .map_err(|e| StageErrorKind::AssetMissing(e.reference().to_string()))?;
    let frame = image::load_from_memory(&bytes)
        .map_err(|e| {
            StageErrorKind::Failed(format!("border asset {} unreadable: {}", reference, e))
        })?;
    Ok(frame
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgba8())
}

fn draw_frame(canvas: &mut RgbaImage, thickness: u32, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    fill_rect(canvas, 0, 0, w, thickness, color);
    fill_rect(canvas, 0, (h - thickness) as i64, w, thickness, color);
    fill_rect(canvas, 0, 0, thickness, h, color);
    fill_rect(canvas, (w - thickness) as i64, 0, thickness, h, color);
}

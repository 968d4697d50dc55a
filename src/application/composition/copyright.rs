use image::Rgba;

use super::border::border_thickness;
use super::context::CompositionContext;
use super::raster::to_rgba;
use super::stage::StageErrorKind;
use super::text::TextRenderer;
use super::working::WorkingImage;
use crate::domain::value_objects::HexColor;

/// Stamp the copyright line into the bottom-right corner, inside any frame
pub(super) fn add_copyright(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    text: Option<&dyn TextRenderer>,
) -> Result<(), StageErrorKind> {
    let Some(spec) = ctx.copyright.as_ref().filter(|c| !c.text.trim().is_empty()) else {
        return Ok(());
    };
    let renderer = text.ok_or_else(|| StageErrorKind::AssetMissing("font".to_string()))?;

    let (w, h) = (working.width(), working.height());
    let px = (h as f32 * 0.022).max(10.0);
    let inset = border_thickness(&ctx.border, w, h) as i32;
    let margin = (px * 0.5).round() as i32;
    let extent = renderer.measure(&spec.text, px);

    let x = w as i32 - inset - margin - extent.width as i32;
    let y = h as i32 - inset - margin - extent.height as i32;
    let color = to_rgba(spec.color.unwrap_or(HexColor::WHITE));

    working.with_canvas(|canvas| {
        renderer.draw(canvas, &spec.text, px, (x + 1, y + 1), Rgba([0, 0, 0, 150]));
        renderer.draw(canvas, &spec.text, px, (x, y), color);
    });
    Ok(())
}

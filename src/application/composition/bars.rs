use image::Rgba;

use super::border::border_thickness;
use super::context::{BarSpec, BarStyle, CompositionContext};
use super::raster::{fill_rect, to_rgba};
use super::stage::StageErrorKind;
use super::text::{fit_font_size, TextRenderer};
use super::working::WorkingImage;
use crate::domain::value_objects::HexColor;

const BRAND_GREEN: HexColor = HexColor::rgba(0x84, 0xb4, 0x14, 255);

/// Placement of one text bar on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub font_px: f32,
    pub padding: u32,
}

/// Stack the bars upwards from the bottom-left corner, in request order.
///
/// `auto_border` is the thickness of an auto-sized frame; bars move in by
/// that much so they never sit on it.
pub fn layout_bars(
    bars: &[BarSpec],
    canvas: (u32, u32),
    auto_border: Option<u32>,
    renderer: &dyn TextRenderer,
) -> Result<Vec<BarLayout>, StageErrorKind> {
    let (w, h) = canvas;
    let extra = auto_border.unwrap_or(0) as i64;
    let left = (w as f64 * 0.05).round() as i64 + extra;
    let bottom = h as i64 - (h as f64 * 0.08).round() as i64 - extra;
    let gap = (h as f64 * 0.01).round() as i64;

    let mut sized = Vec::with_capacity(bars.len());
    for (index, bar) in bars.iter().enumerate() {
        if bar.text.trim().is_empty() {
            return Err(StageErrorKind::Failed(format!("bar {} has no text", index + 1)));
        }
        let base_px = match bar.style {
            BarStyle::Headline => h as f32 * 0.07,
            BarStyle::Subline => h as f32 * 0.045,
        }
        .max(8.0);
        let padding = (base_px * 0.25).round() as u32;
        let max_text = (w as i64 - 2 * left - 2 * padding as i64).max(1) as u32;
        let font_px = fit_font_size(renderer, &bar.text, base_px, max_text);
        let extent = renderer.measure(&bar.text, font_px);
        sized.push((font_px, padding, extent));
    }

    let mut layouts = vec![None; bars.len()];
    let mut cursor = bottom;
    for (index, (font_px, padding, extent)) in sized.into_iter().enumerate().rev() {
        let height = extent.height + 2 * padding;
        cursor -= height as i64;
        layouts[index] = Some(BarLayout {
            x: left,
            y: cursor,
            width: extent.width + 2 * padding,
            height,
            font_px,
            padding,
        });
        cursor -= gap;
    }

    Ok(layouts.into_iter().flatten().collect())
}

pub(super) fn add_bars(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    text: Option<&dyn TextRenderer>,
) -> Result<(), StageErrorKind> {
    if ctx.bars.is_empty() {
        return Ok(());
    }
    let renderer = text.ok_or_else(|| StageErrorKind::AssetMissing("font".to_string()))?;

    let (w, h) = (working.width(), working.height());
    let auto_border = ctx
        .auto_border()
        .then(|| border_thickness(&ctx.border, w, h));
    let layouts = layout_bars(&ctx.bars, (w, h), auto_border, renderer)?;

    working.with_canvas(|canvas| {
        for (bar, layout) in ctx.bars.iter().zip(&layouts) {
            let (background, foreground) = bar_colors(bar);
            fill_rect(canvas, layout.x, layout.y, layout.width, layout.height, background);
            renderer.draw(
                canvas,
                &bar.text,
                layout.font_px,
                (
                    (layout.x + layout.padding as i64) as i32,
                    (layout.y + layout.padding as i64) as i32,
                ),
                foreground,
            );
        }
    });
    Ok(())
}

fn bar_colors(bar: &BarSpec) -> (Rgba<u8>, Rgba<u8>) {
    let (bg, fg) = match bar.style {
        BarStyle::Headline => (BRAND_GREEN, HexColor::WHITE),
        BarStyle::Subline => (HexColor::WHITE, BRAND_GREEN),
    };
    (
        to_rgba(bar.background.unwrap_or(bg)),
        to_rgba(bar.color.unwrap_or(fg)),
    )
}

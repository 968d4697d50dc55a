use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;
use regex::Regex;

use super::border::border_thickness;
use super::context::{BorderKind, CompositionContext};
use super::stage::StageErrorKind;
use super::text::{fit_font_size, TextRenderer};
use super::working::WorkingImage;
use crate::application::ports::AssetSource;

/// Logo width relative to the canvas width
const LOGO_WIDTH_RATIO: f64 = 0.22;
const LOGO_MARGIN_RATIO: f64 = 0.04;

/// A source-path rewrite applied before the logo is loaded
pub struct LogoRewrite {
    pattern: Regex,
    replacement: &'static str,
}

/// Vector logos the renderer mishandles, mapped to their raster twins.
///
/// The "alternative" logo set uses SVG features the rasterizer does not
/// draw correctly; a PNG export sits next to each of them.
pub static LOGO_REWRITES: Lazy<Vec<LogoRewrite>> = Lazy::new(|| {
    vec![LogoRewrite {
        pattern: Regex::new(r"^(?P<stem>.+alternative.*)\.svg$")
            .expect("Invalid logo rewrite pattern"),
        replacement: "$stem.png",
    }]
});

/// Apply the first matching rewrite, if any
pub fn rewrite_logo_source(src: &str) -> Cow<'_, str> {
    for rewrite in LOGO_REWRITES.iter() {
        if rewrite.pattern.is_match(src) {
            return rewrite.pattern.replace(src, rewrite.replacement);
        }
    }
    Cow::Borrowed(src)
}

pub(super) fn add_logo(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    assets: &dyn AssetSource,
    text: Option<&dyn TextRenderer>,
) -> Result<(), StageErrorKind> {
    let Some(spec) = &ctx.logo else {
        return Ok(());
    };
    let subline = spec.subline.as_deref().filter(|s| !s.trim().is_empty());
    let renderer = match subline {
        Some(_) => Some(text.ok_or_else(|| StageErrorKind::AssetMissing("font".to_string()))?),
        None => None,
    };

    let source = rewrite_logo_source(&spec.src);
    let bytes = assets
        .load(&source)
        .map_err(|e| StageErrorKind::AssetMissing(e.reference().to_string()))?;

    let (w, h) = (working.width(), working.height());
    let target_width = ((w as f64 * LOGO_WIDTH_RATIO).round() as u32).max(1);
    let logo = if source.to_ascii_lowercase().ends_with(".svg") {
        rasterize_svg(&bytes, &source, target_width)?
    } else {
        scale_raster(&bytes, &source, target_width)?
    };

    let mut margin = (w as f64 * LOGO_MARGIN_RATIO).round() as i64;
    if ctx.border.kind == BorderKind::Auto {
        margin += border_thickness(&ctx.border, w, h) as i64;
    }
    let x = w as i64 - margin - logo.width() as i64;
    let y = margin;

    working.with_canvas(|canvas| {
        imageops::overlay(canvas, &logo, x, y);
        if let (Some(line), Some(renderer)) = (subline, renderer) {
            let px = fit_font_size(
                renderer,
                line,
                (logo.height() as f32 * 0.2).max(10.0),
                logo.width(),
            );
            let extent = renderer.measure(line, px);
            let line_x = x + logo.width() as i64 - extent.width as i64;
            let line_y = y + logo.height() as i64 + (px * 0.3).round() as i64;
            renderer.draw(
                canvas,
                line,
                px,
                (line_x as i32, line_y as i32),
                Rgba([255, 255, 255, 255]),
            );
        }
    });
    Ok(())
}

fn rasterize_svg(bytes: &[u8], reference: &str, width: u32) -> Result<RgbaImage, StageErrorKind> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| StageErrorKind::Failed(format!("logo {} unreadable: {}", reference, e)))?;
    let size = tree.size();
    if !(size.width() > 0.0 && size.height() > 0.0) {
        return Err(StageErrorKind::Failed(format!("logo {} has no size", reference)));
    }

    let height = ((width as f32 * size.height() / size.width()).round() as u32).max(1);
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| StageErrorKind::Failed("failed to allocate logo pixmap".to_string()))?;
    let transform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(out)
}

fn scale_raster(bytes: &[u8], reference: &str, width: u32) -> Result<RgbaImage, StageErrorKind> {
    let logo = image::load_from_memory(bytes)
        .map_err(|e| StageErrorKind::Failed(format!("logo {} unreadable: {}", reference, e)))?;
    let height = ((width as f64 * logo.height() as f64 / logo.width().max(1) as f64).round() as u32)
        .max(1);
    Ok(logo.resize_exact(width, height, FilterType::Lanczos3).to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternative_svg_is_rewritten_to_png() {
        assert_eq!(
            rewrite_logo_source("logos/alternative/green.svg"),
            "logos/alternative/green.png"
        );
        assert_eq!(
            rewrite_logo_source("logos/green-alternative.svg"),
            "logos/green-alternative.png"
        );
    }

    #[test]
    fn test_other_sources_are_untouched() {
        assert!(matches!(
            rewrite_logo_source("logos/green.svg"),
            Cow::Borrowed("logos/green.svg")
        ));
        assert_eq!(
            rewrite_logo_source("logos/alternative/green.png"),
            "logos/alternative/green.png"
        );
    }

    #[test]
    fn test_leading_alternative_is_not_rewritten() {
        // the match must start after the first character
        assert_eq!(rewrite_logo_source("alternative.svg"), "alternative.svg");
    }

    #[test]
    fn test_rasterize_simple_svg() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50">
            <rect width="100" height="50" fill="#ff0000"/></svg>"##;
        let logo = rasterize_svg(svg, "red.svg", 40).unwrap();
        assert_eq!(logo.dimensions(), (40, 20));
        assert_eq!(logo.get_pixel(20, 10), &Rgba([255, 0, 0, 255]));
    }
}

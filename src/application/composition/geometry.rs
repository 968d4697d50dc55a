//! Pixel math shared by the crop, border and bar stages.
//!
//! Crop coordinates arrive in preview space and are divided by the zoom in
//! `f64` before anything is rounded, so crop and resize never compound
//! rounding error.

/// Source-pixel rectangle to cut out of the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map the preview viewport back onto the source image.
///
/// The viewport is `(width/zoom, height/zoom)` source pixels anchored at
/// `(-x/zoom, -y/zoom)`. A viewport larger than the source is shrunk
/// uniformly until it fits, then the origin is clamped into the source, so
/// an overshooting drag never fails.
pub fn crop_region(
    source: (u32, u32),
    preview: (u32, u32),
    zoom: f64,
    offset: (f64, f64),
) -> CropRegion {
    let (src_w, src_h) = (source.0.max(1) as f64, source.1.max(1) as f64);

    let mut w = preview.0 as f64 / zoom;
    let mut h = preview.1 as f64 / zoom;
    if w > src_w || h > src_h {
        let shrink = (src_w / w).min(src_h / h);
        w *= shrink;
        h *= shrink;
    }

    let left = (-offset.0 / zoom).clamp(0.0, (src_w - w).max(0.0));
    let top = (-offset.1 / zoom).clamp(0.0, (src_h - h).max(0.0));

    let width = (w.round() as u32).clamp(1, source.0.max(1));
    let height = (h.round() as u32).clamp(1, source.1.max(1));
    let x = (left.round() as u32).min(source.0.saturating_sub(width));
    let y = (top.round() as u32).min(source.1.saturating_sub(height));

    CropRegion {
        x,
        y,
        width,
        height,
    }
}

/// Frame thickness for `auto` borders: 2.5% of the shorter edge
pub fn auto_border_thickness(width: u32, height: u32) -> u32 {
    ((width.min(height) as f64 * 0.025).round() as u32).max(1)
}

/// Largest size with the same aspect that fits in a `max_edge` square
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width.max(1), height.max(1));
    }
    let scale = max_edge as f64 / width.max(height) as f64;
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

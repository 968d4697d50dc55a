use image::{Rgba, RgbaImage};

/// Source-over blend of `color` with the given coverage into one pixel
pub fn blend_pixel(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let sa = (color.0[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let src = color.0[c] as f32 * sa;
        let dst_c = dst.0[c] as f32 * da * (1.0 - sa);
        dst.0[c] = ((src + dst_c) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Blend a solid rectangle, clipped to the canvas
pub fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x + width as i64).clamp(0, canvas.width() as i64) as u32;
    let y1 = (y + height as i64).clamp(0, canvas.height() as i64) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(canvas.get_pixel_mut(px, py), color, 1.0);
        }
    }
}

pub fn to_rgba(color: crate::domain::value_objects::HexColor) -> Rgba<u8> {
    Rgba(color.channels())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_fill_replaces_pixels() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        fill_rect(&mut canvas, 1, 1, 2, 2, Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_fill_is_clipped() {
        let mut canvas = RgbaImage::new(2, 2);
        fill_rect(&mut canvas, -5, -5, 100, 100, Rgba([1, 2, 3, 255]));
        assert!(canvas.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_half_alpha_over_opaque() {
        let mut px = Rgba([0, 0, 0, 255]);
        blend_pixel(&mut px, Rgba([255, 255, 255, 128]), 1.0);
        assert_eq!(px.0[3], 255);
        assert!((px.0[0] as i32 - 128).abs() <= 1);
    }
}

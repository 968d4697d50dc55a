use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader, Limits, Rgba, RgbaImage};
use tracing::debug;

use super::context::{BackgroundSource, CompositionContext};
use super::raster::to_rgba;
use super::stage::StageErrorKind;
use super::working::WorkingImage;
use crate::domain::value_objects::HexColor;

/// Load or synthesize the background for a run
pub(super) fn acquire(
    ctx: &CompositionContext,
    max_source_edge: u32,
) -> Result<WorkingImage, StageErrorKind> {
    match &ctx.background {
        BackgroundSource::Custom { path } => {
            let bytes = std::fs::read(path).map_err(|e| {
                StageErrorKind::InvalidImage(format!("cannot read {}: {}", path.display(), e))
            })?;
            decode_photo(&bytes, max_source_edge)
        }
        BackgroundSource::Gradient { from, to } => Ok(WorkingImage::new(
            DynamicImage::ImageRgba8(vertical_gradient(ctx.width, ctx.height, *from, *to)),
            1,
            None,
        )),
        BackgroundSource::Transparent => Ok(WorkingImage::new(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                ctx.width,
                ctx.height,
                Rgba([0, 0, 0, 0]),
            )),
            1,
            None,
        )),
    }
}

fn decode_photo(bytes: &[u8], max_source_edge: u32) -> Result<WorkingImage, StageErrorKind> {
    let invalid = |e: image::ImageError| StageErrorKind::InvalidImage(e.to_string());

    let mut limits = Limits::default();
    limits.max_image_width = Some(max_source_edge);
    limits.max_image_height = Some(max_source_edge);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StageErrorKind::InvalidImage(e.to_string()))?;
    reader.limits(limits);

    let mut decoder = reader.into_decoder().map_err(invalid)?;
    let icc_profile = decoder.icc_profile().map_err(invalid)?;
    let image = DynamicImage::from_decoder(decoder).map_err(invalid)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(StageErrorKind::InvalidImage("image has no pixels".to_string()));
    }

    Ok(WorkingImage::new(
        image,
        read_exif_orientation(bytes),
        icc_profile,
    ))
}

/// Reads EXIF tag 0x0112 (Orientation); 1 when absent or unreadable
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(_) => return 1,
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .filter(|o| (1..=8).contains(o))
        .unwrap_or(1)
}

pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Rotate the pixels upright once, then forget the tag
pub(super) fn orient(working: &mut WorkingImage) -> Result<(), StageErrorKind> {
    if working.orientation != 1 {
        let image = std::mem::replace(&mut working.image, DynamicImage::new_rgba8(0, 0));
        working.image = apply_orientation(image, working.orientation);
        working.source_size = (working.image.width(), working.image.height());
    }
    working.orientation = 1;
    Ok(())
}

/// Bring any decoded layout to 8-bit sRGB RGBA and drop the embedded profile.
///
/// Pixels tagged with an RGB ICC profile are transformed into sRGB first.
/// A profile qcms cannot parse or pair with RGBA data (CMYK, Lab) leaves the
/// decoded values as they are.
pub(super) fn normalize_color_profile(working: &mut WorkingImage) -> Result<(), StageErrorKind> {
    if !matches!(working.image, DynamicImage::ImageRgba8(_)) {
        working.image = DynamicImage::ImageRgba8(working.image.to_rgba8());
    }
    if let Some(icc) = working.icc_profile.take() {
        match qcms::Profile::new_from_slice(&icc, false) {
            Some(profile) => {
                if let DynamicImage::ImageRgba8(canvas) = &mut working.image {
                    if !convert_to_srgb(canvas, &profile) {
                        debug!(bytes = icc.len(), "no RGBA transform for embedded profile");
                    }
                }
            }
            None => debug!(bytes = icc.len(), "ignoring unreadable ICC profile"),
        }
    }
    Ok(())
}

/// Transform RGBA pixels from `profile` into sRGB in place; false when the
/// profile cannot drive an RGBA transform
fn convert_to_srgb(canvas: &mut RgbaImage, profile: &qcms::Profile) -> bool {
    let mut srgb = qcms::Profile::new_sRGB();
    srgb.precache_output_transform();
    match qcms::Transform::new(profile, &srgb, qcms::DataType::RGBA8, qcms::Intent::Perceptual) {
        Some(transform) => {
            transform.apply(canvas);
            true
        }
        None => false,
    }
}

fn vertical_gradient(width: u32, height: u32, from: HexColor, to: HexColor) -> RgbaImage {
    let (a, b) = (to_rgba(from), to_rgba(to));
    let span = height.saturating_sub(1).max(1) as f32;
    RgbaImage::from_fn(width, height, |_, y| {
        let t = y as f32 / span;
        let mix = |i: usize| (a.0[i] as f32 + (b.0[i] as f32 - a.0[i] as f32) * t).round() as u8;
        Rgba([mix(0), mix(1), mix(2), mix(3)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_apply_orientation_rotate90() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 20, Rgb([1, 2, 3])));
        let result = apply_orientation(img, 6);
        assert_eq!((result.width(), result.height()), (20, 10));
    }

    #[test]
    fn test_apply_orientation_unknown_is_identity() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 20, Rgb([1, 2, 3])));
        let result = apply_orientation(img, 99);
        assert_eq!((result.width(), result.height()), (10, 20));
    }

    #[test]
    fn test_orient_resets_tag() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 20, Rgb([1, 2, 3])));
        let mut working = WorkingImage::new(img, 8, None);
        orient(&mut working).unwrap();
        assert_eq!(working.orientation(), 1);
        assert_eq!(working.source_size, (20, 10));

        // a second pass must not rotate again
        orient(&mut working).unwrap();
        assert_eq!((working.width(), working.height()), (20, 10));
    }

    #[test]
    fn test_normalize_drops_profile_and_converts() {
        let img = DynamicImage::ImageLuma16(image::ImageBuffer::from_pixel(
            3,
            3,
            image::Luma([65535u16]),
        ));
        let mut working = WorkingImage::new(img, 1, Some(vec![1, 2, 3]));
        normalize_color_profile(&mut working).unwrap();
        assert!(!working.has_icc_profile());
        match working.image() {
            DynamicImage::ImageRgba8(canvas) => {
                assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 255, 255, 255]))
            }
            other => panic!("unexpected layout {:?}", other.color()),
        }
    }

    fn wide_gamut_profile() -> Box<qcms::Profile> {
        let d65 = qcms::CIE_xyY { x: 0.3127, y: 0.3290, Y: 1.0 };
        let adobe_rgb = qcms::CIE_xyYTRIPLE {
            red: qcms::CIE_xyY { x: 0.64, y: 0.33, Y: 1.0 },
            green: qcms::CIE_xyY { x: 0.21, y: 0.71, Y: 1.0 },
            blue: qcms::CIE_xyY { x: 0.15, y: 0.06, Y: 1.0 },
        };
        qcms::Profile::new_rgb_with_gamma_set(d65, adobe_rgb, 2.2, 2.2, 2.2).unwrap()
    }

    #[test]
    fn test_wide_gamut_pixels_are_converted() {
        let original = Rgba([40, 200, 60, 255]);
        let mut canvas = RgbaImage::from_pixel(4, 4, original);

        assert!(convert_to_srgb(&mut canvas, &wide_gamut_profile()));

        let converted = *canvas.get_pixel(0, 0);
        assert_ne!(converted, original);
        // saturated green lies outside sRGB, so red drops and green stays high
        assert!(converted.0[0] < original.0[0]);
        assert!(converted.0[1] >= 190);
        assert_eq!(converted.0[3], 255);
    }

    #[test]
    fn test_unreadable_profile_keeps_pixels() {
        let original = Rgba([40, 200, 60, 255]);
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, original));
        let mut working = WorkingImage::new(img, 1, Some(b"not a profile".to_vec()));

        normalize_color_profile(&mut working).unwrap();

        assert!(!working.has_icc_profile());
        assert_eq!(working.image().to_rgba8().get_pixel(1, 1), &original);
    }

    #[test]
    fn test_no_exif_means_upright() {
        assert_eq!(read_exif_orientation(b"not an image"), 1);
    }

    #[test]
    fn test_garbage_bytes_are_invalid_image() {
        let err = decode_photo(b"definitely not a picture", 10_000).unwrap_err();
        assert!(matches!(err, StageErrorKind::InvalidImage(_)));
    }

    #[test]
    fn test_gradient_runs_from_top_to_bottom_colour() {
        let canvas = vertical_gradient(2, 11, HexColor::BLACK, HexColor::WHITE);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 10), &Rgba([255, 255, 255, 255]));
    }
}

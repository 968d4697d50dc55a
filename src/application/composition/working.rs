use image::{DynamicImage, RgbaImage};

/// The pixels one composition run is working on.
///
/// Owned by exactly one run; dropped on every exit path.
#[derive(Debug)]
pub struct WorkingImage {
    pub(super) image: DynamicImage,
    /// EXIF orientation still to be applied; 1 means upright
    pub(super) orientation: u32,
    pub(super) icc_profile: Option<Vec<u8>>,
    /// Upright size of the source before cropping
    pub(super) source_size: (u32, u32),
    pub(super) saved: Option<String>,
    pub(super) thumb: Option<String>,
    pub(super) raw_thumb_written: bool,
}

impl WorkingImage {
    pub(super) fn new(image: DynamicImage, orientation: u32, icc_profile: Option<Vec<u8>>) -> Self {
        let source_size = (image.width(), image.height());
        Self {
            image,
            orientation,
            icc_profile,
            source_size,
            saved: None,
            thumb: None,
            raw_thumb_written: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn orientation(&self) -> u32 {
        self.orientation
    }

    pub fn has_icc_profile(&self) -> bool {
        self.icc_profile.is_some()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Run `f` against the pixels as 8-bit RGBA, converting once if needed
    pub(super) fn with_canvas<R>(&mut self, f: impl FnOnce(&mut RgbaImage) -> R) -> R {
        let mut canvas =
            std::mem::replace(&mut self.image, DynamicImage::new_rgba8(0, 0)).into_rgba8();
        let out = f(&mut canvas);
        self.image = DynamicImage::ImageRgba8(canvas);
        out
    }
}

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::warn;
use uuid::Uuid;

use super::context::CompositionContext;
use super::geometry::fit_within;
use super::stage::StageErrorKind;
use super::working::WorkingImage;
use crate::domain::value_objects::BackgroundKind;

/// Files written during a run; removed on drop unless the run succeeded
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
    committed: bool,
}

impl ScratchFiles {
    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Keep every tracked file
    pub fn commit(mut self) -> Vec<PathBuf> {
        self.committed = true;
        std::mem::take(&mut self.paths)
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in &self.paths {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove scratch file");
                }
            }
        }
    }
}

/// Output format of the final image: PNG keeps transparency
pub fn final_format(kind: BackgroundKind) -> ImageFormat {
    match kind {
        BackgroundKind::Transparent => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    }
}

fn format_for_path(path: &Path) -> ImageFormat {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP)) => format,
        _ => ImageFormat::Jpeg,
    }
}

pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    if format == ImageFormat::Jpeg {
        let rgb = image.to_rgb8();
        JpegEncoder::new_with_quality(&mut bytes, jpeg_quality).write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )?;
    } else {
        DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut bytes), format)?;
    }
    Ok(bytes)
}

/// Write next to the target under a hidden temp name, then rename over it
pub fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let temp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = (|| {
        let mut file = std::fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    result
}

fn write_image(
    path: &Path,
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<(), StageErrorKind> {
    let bytes = encode(image, format, jpeg_quality)
        .map_err(|e| StageErrorKind::Failed(format!("encoding failed: {}", e)))?;
    write_atomically(path, &bytes)
        .map_err(|e| StageErrorKind::Failed(format!("cannot write {}: {}", path.display(), e)))
}

/// Thumbnail of the cropped background, written once per raw image
pub(super) fn make_raw_thumb(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    scratch: &mut ScratchFiles,
    max_edge: u32,
    jpeg_quality: u8,
) -> Result<(), StageErrorKind> {
    let Some(path) = &ctx.output.raw_thumb else {
        return Ok(());
    };
    if path.exists() {
        return Ok(());
    }

    let (w, h) = fit_within(working.width(), working.height(), max_edge);
    let thumb = working.image.thumbnail_exact(w, h);
    scratch.track(path.clone());
    write_image(path, &thumb, format_for_path(path), jpeg_quality)?;
    working.raw_thumb_written = true;
    Ok(())
}

pub(super) fn save(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    scratch: &mut ScratchFiles,
    jpeg_quality: u8,
) -> Result<(), StageErrorKind> {
    let format = final_format(ctx.background_kind());
    let extension = format.extensions_str().first().copied().unwrap_or("jpg");
    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = ctx.output.final_dir.join(&file_name);

    scratch.track(path.clone());
    write_image(&path, &working.image, format, jpeg_quality)?;
    working.saved = Some(file_name);
    Ok(())
}

pub(super) fn make_final_thumb(
    ctx: &CompositionContext,
    working: &mut WorkingImage,
    scratch: &mut ScratchFiles,
    max_edge: u32,
    jpeg_quality: u8,
) -> Result<(), StageErrorKind> {
    let file_name = working
        .saved
        .clone()
        .ok_or_else(|| StageErrorKind::Failed("final image was not saved".to_string()))?;
    let path = ctx.output.final_thumb_dir.join(&file_name);

    let (w, h) = fit_within(working.width(), working.height(), max_edge);
    let thumb = working.image.thumbnail_exact(w, h);
    scratch.track(path.clone());
    write_image(
        &path,
        &thumb,
        final_format(ctx.background_kind()),
        jpeg_quality,
    )?;
    working.thumb = Some(file_name);
    Ok(())
}

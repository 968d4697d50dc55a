use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use crate::application::composition::{blend_pixel, TextExtent, TextRenderer};
use crate::application::ports::{AssetError, AssetSource};

/// `TextRenderer` backed by a TrueType/OpenType font
pub struct FontRenderer {
    font: Font<'static>,
}

impl FontRenderer {
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self { font })
    }

    /// Load the font through the asset source; unparsable data counts as missing
    pub fn from_asset(assets: &dyn AssetSource, reference: &str) -> Result<Self, AssetError> {
        let bytes = assets.load(reference)?;
        Self::from_bytes(bytes).ok_or_else(|| AssetError::NotFound(reference.to_string()))
    }
}

impl TextRenderer for FontRenderer {
    fn measure(&self, text: &str, px: f32) -> TextExtent {
        let scale = Scale::uniform(px);
        let v_metrics = self.font.v_metrics(scale);
        let height = (v_metrics.ascent - v_metrics.descent).ceil().max(0.0) as u32;

        let width = self
            .font
            .layout(text, scale, point(0.0, v_metrics.ascent))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);

        TextExtent {
            width: width.ceil().max(0.0) as u32,
            height,
        }
    }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        px: f32,
        origin: (i32, i32),
        color: Rgba<u8>,
    ) {
        let scale = Scale::uniform(px);
        let v_metrics = self.font.v_metrics(scale);
        let start = point(origin.0 as f32, origin.1 as f32 + v_metrics.ascent);
        let (width, height) = canvas.dimensions();

        for glyph in self.font.layout(text, scale, start) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let x = gx as i32 + bb.min.x;
                let y = gy as i32 + bb.min.y;
                if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
                    return;
                }
                blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
            });
        }
    }
}

use image::{Rgba, RgbaImage};

/// Measured extent of a single line of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    /// Ascent plus descent at the requested size
    pub height: u32,
}

/// Draws single lines of text onto the canvas
pub trait TextRenderer: Send + Sync {
    fn measure(&self, text: &str, px: f32) -> TextExtent;

    /// `origin` is the top-left corner of the line box
    fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        px: f32,
        origin: (i32, i32),
        color: Rgba<u8>,
    );
}

/// Largest size at or below `px` at which `text` fits in `max_width`
pub fn fit_font_size(renderer: &dyn TextRenderer, text: &str, px: f32, max_width: u32) -> f32 {
    let width = renderer.measure(text, px).width;
    if width <= max_width || width == 0 {
        return px;
    }
    (px * max_width as f32 / width as f32).floor().max(1.0)
}

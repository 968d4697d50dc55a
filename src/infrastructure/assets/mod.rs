mod filesystem_assets;
mod font_renderer;

pub use filesystem_assets::{normalize_asset_path, FilesystemAssets};
pub use font_renderer::FontRenderer;

//! The image composition pipeline.
//!
//! A [`CompositionEngine`] turns a [`CompositionContext`] into a final image
//! and thumbnail by running the twelve [`Stage`]s in order. Each stage
//! returns a `Result`; the first error ends the run and every file the run
//! wrote is removed again.

mod acquire;
mod bars;
mod border;
mod context;
mod copyright;
mod engine;
mod geometry;
mod logo;
mod observer;
mod output;
mod raster;
mod stage;
mod text;
mod transform;
mod working;

pub use acquire::{apply_orientation, read_exif_orientation};
pub use bars::{layout_bars, BarLayout};
pub use border::border_thickness;
pub use context::{
    BackgroundSource, BarSpec, BarStyle, BorderKind, BorderSpec, CompositionContext,
    CopyrightSpec, LogoSpec, OutputTargets, DEFAULT_GRADIENT_FROM, DEFAULT_GRADIENT_TO,
};
pub use engine::{CompositionEngine, CompositionOutput, EngineSettings};
pub use geometry::{auto_border_thickness, crop_region, fit_within, CropRegion};
pub use logo::{rewrite_logo_source, LogoRewrite, LOGO_REWRITES};
pub use observer::{RecordingObserver, StageEvent, StageObserver, TracingObserver};
pub use output::{encode, final_format, write_atomically, ScratchFiles};
pub use raster::{blend_pixel, fill_rect};
pub use stage::{Stage, StageError, StageErrorKind};
pub use text::{fit_font_size, TextExtent, TextRenderer};
pub use working::WorkingImage;

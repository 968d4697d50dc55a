use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BackgroundKind, HexColor};

pub const DEFAULT_GRADIENT_FROM: HexColor = HexColor::rgba(0x84, 0xb4, 0x14, 255);
pub const DEFAULT_GRADIENT_TO: HexColor = HexColor::rgba(0x2a, 0x6b, 0x1e, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderKind {
    #[default]
    None,
    Fixed,
    Auto,
}

impl std::fmt::Display for BorderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BorderKind::None => write!(f, "none"),
            BorderKind::Fixed => write!(f, "fixed"),
            BorderKind::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderSpec {
    #[serde(rename = "type", default)]
    pub kind: BorderKind,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub color: Option<HexColor>,
    /// Frame image stretched over the canvas instead of a plain colour
    #[serde(default)]
    pub asset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyrightSpec {
    pub text: String,
    #[serde(default)]
    pub color: Option<HexColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoSpec {
    pub src: String,
    #[serde(default)]
    pub subline: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarStyle {
    #[default]
    Headline,
    Subline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSpec {
    pub text: String,
    #[serde(default)]
    pub style: BarStyle,
    #[serde(default)]
    pub background: Option<HexColor>,
    #[serde(default)]
    pub color: Option<HexColor>,
}

/// Where the background pixels come from
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSource {
    Custom { path: PathBuf },
    Gradient { from: HexColor, to: HexColor },
    Transparent,
}

impl BackgroundSource {
    pub fn kind(&self) -> BackgroundKind {
        match self {
            BackgroundSource::Custom { .. } => BackgroundKind::Custom,
            BackgroundSource::Gradient { .. } => BackgroundKind::Gradient,
            BackgroundSource::Transparent => BackgroundKind::Transparent,
        }
    }
}

/// Where the engine writes its files
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTargets {
    pub final_dir: PathBuf,
    pub final_thumb_dir: PathBuf,
    /// Thumbnail of the raw background, only for custom backgrounds
    pub raw_thumb: Option<PathBuf>,
}

/// Everything one composition run needs, passed explicitly to every stage
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionContext {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    /// Preview-space offset of the background's top-left corner
    pub offset: (f64, f64),
    pub background: BackgroundSource,
    pub border: BorderSpec,
    pub copyright: Option<CopyrightSpec>,
    pub logo: Option<LogoSpec>,
    pub bars: Vec<BarSpec>,
    pub output: OutputTargets,
}

impl CompositionContext {
    pub fn background_kind(&self) -> BackgroundKind {
        self.background.kind()
    }

    /// Bars move clear of the frame only when its size is computed
    pub fn auto_border(&self) -> bool {
        self.border.kind == BorderKind::Auto
    }
}

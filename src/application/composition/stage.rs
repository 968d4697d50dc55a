use thiserror::Error;

use crate::domain::value_objects::BackgroundKind;

/// The fixed, ordered composition steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Acquire,
    Orient,
    NormalizeColorProfile,
    Crop,
    Resize,
    MakeRawThumb,
    AddBorder,
    AddCopyright,
    AddLogo,
    AddBars,
    Save,
    MakeFinalThumb,
}

impl Stage {
    pub const ALL: [Stage; 12] = [
        Stage::Acquire,
        Stage::Orient,
        Stage::NormalizeColorProfile,
        Stage::Crop,
        Stage::Resize,
        Stage::MakeRawThumb,
        Stage::AddBorder,
        Stage::AddCopyright,
        Stage::AddLogo,
        Stage::AddBars,
        Stage::Save,
        Stage::MakeFinalThumb,
    ];

    /// Photo-only stages are skipped for generated backgrounds
    pub fn applies_to(&self, kind: BackgroundKind) -> bool {
        match self {
            Stage::Orient
            | Stage::NormalizeColorProfile
            | Stage::Crop
            | Stage::Resize
            | Stage::MakeRawThumb => kind.is_custom(),
            _ => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Acquire => "Acquire",
            Stage::Orient => "Orient",
            Stage::NormalizeColorProfile => "NormalizeColorProfile",
            Stage::Crop => "Crop",
            Stage::Resize => "Resize",
            Stage::MakeRawThumb => "MakeRawThumb",
            Stage::AddBorder => "AddBorder",
            Stage::AddCopyright => "AddCopyright",
            Stage::AddLogo => "AddLogo",
            Stage::AddBars => "AddBars",
            Stage::Save => "Save",
            Stage::MakeFinalThumb => "MakeFinalThumb",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageErrorKind {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("asset missing: {0}")]
    AssetMissing(String),

    #[error("{0}")]
    Failed(String),
}

/// First failure of a composition run, tagged with the stage it came from
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage}: {kind}")]
pub struct StageError {
    pub stage: Stage,
    pub kind: StageErrorKind,
}

impl StageError {
    pub fn new(stage: Stage, kind: StageErrorKind) -> Self {
        Self { stage, kind }
    }
}

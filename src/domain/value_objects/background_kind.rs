use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// What the composition is painted on.
///
/// Clients send the numeric codes `0`, `1` and `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BackgroundKind {
    Gradient,
    Transparent,
    Custom,
}

impl BackgroundKind {
    pub fn code(&self) -> u8 {
        match self {
            BackgroundKind::Gradient => 0,
            BackgroundKind::Transparent => 1,
            BackgroundKind::Custom => 2,
        }
    }

    /// Only custom photos go through orientation, colour and crop handling
    pub fn is_custom(&self) -> bool {
        matches!(self, BackgroundKind::Custom)
    }
}

impl TryFrom<u8> for BackgroundKind {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BackgroundKind::Gradient),
            1 => Ok(BackgroundKind::Transparent),
            2 => Ok(BackgroundKind::Custom),
            other => Err(DomainError::UnknownBackgroundKind(other)),
        }
    }
}

impl From<BackgroundKind> for u8 {
    fn from(kind: BackgroundKind) -> Self {
        kind.code()
    }
}

impl std::fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackgroundKind::Gradient => write!(f, "gradient"),
            BackgroundKind::Transparent => write!(f, "transparent"),
            BackgroundKind::Custom => write!(f, "custom"),
        }
    }
}

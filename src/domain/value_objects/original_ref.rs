use serde::{Deserialize, Serialize};

use super::ImageId;
use crate::domain::errors::DomainError;

/// What a final image was composed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum OriginalRef {
    Raw(ImageId),
    Gradient,
    Transparent,
}

impl OriginalRef {
    pub fn raw_id(&self) -> Option<ImageId> {
        match self {
            OriginalRef::Raw(id) => Some(*id),
            _ => None,
        }
    }

    /// Column encoding: the raw image uuid, or one of the sentinel words
    pub fn to_column(&self) -> String {
        match self {
            OriginalRef::Raw(id) => id.to_string(),
            OriginalRef::Gradient => "gradient".to_string(),
            OriginalRef::Transparent => "transparent".to_string(),
        }
    }

    pub fn from_column(value: &str) -> Result<Self, DomainError> {
        match value {
            "gradient" => Ok(OriginalRef::Gradient),
            "transparent" => Ok(OriginalRef::Transparent),
            other => ImageId::from_string(other)
                .map(OriginalRef::Raw)
                .map_err(|_| DomainError::InvalidOriginalRef(other.to_string())),
        }
    }
}

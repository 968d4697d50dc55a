#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset reference rejected: {0}")]
    Rejected(String),

    #[error("I/O error reading {reference}: {source}")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    pub fn reference(&self) -> &str {
        match self {
            AssetError::NotFound(r) | AssetError::Rejected(r) => r,
            AssetError::Io { reference, .. } => reference,
        }
    }
}

/// Port for logo, border and font files.
///
/// Synchronous: it is only consulted from inside the blocking composition
/// worker.
#[cfg_attr(test, automock)]
pub trait AssetSource: Send + Sync {
    fn load(&self, reference: &str) -> Result<Vec<u8>, AssetError>;
}

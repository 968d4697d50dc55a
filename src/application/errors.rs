//! Error type shared by the composition flow

use thiserror::Error;

use crate::application::composition::StageError;
use crate::application::ports::{RepositoryError, StorageError};
use crate::domain::errors::DomainError;

/// Failure of one composition request.
///
/// The `Display` text is what the boundary sends back to the client.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Upload incomplete: {0}")]
    UploadIncomplete(String),

    #[error("Duplicate resolution failed: {0}")]
    DuplicateResolution(String),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Composition worker failed: {0}")]
    Worker(String),
}

impl From<DomainError> for ComposeError {
    fn from(e: DomainError) -> Self {
        ComposeError::InvalidRequest(e.to_string())
    }
}

use thiserror::Error;

/// Errors that can occur during a sweep
#[derive(Debug, Error)]
pub enum GcError {
    /// Listing candidates failed; nothing was removed
    #[error("Failed to query for garbage collection candidates: {source}")]
    QueryError {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to delete item during collection: {source}")]
    DeletionError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Some items of a batch were removed, others failed
    #[error("Partial failure during batch deletion: {successful}/{total} items deleted successfully")]
    PartialBatchFailure {
        successful: usize,
        total: usize,
        failures: Vec<String>,
    },
}

pub type CollectorResult<T> = Result<T, GcError>;

impl GcError {
    pub fn deletion_error(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::DeletionError {
            source: source.into(),
        }
    }
}

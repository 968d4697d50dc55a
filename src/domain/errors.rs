use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid image id: {0}")]
    InvalidImageId(String),

    #[error("Invalid requester id: {0}")]
    InvalidRequesterId(String),

    #[error("Content hash mismatch: expected {expected}, got {actual}")]
    ContentHashMismatch { expected: String, actual: String },

    #[error("Unknown background kind: {0}")]
    UnknownBackgroundKind(u8),

    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Unknown original reference: {0}")]
    InvalidOriginalRef(String),
}

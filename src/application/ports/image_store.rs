use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use super::CompletedUpload;
use crate::domain::value_objects::{ContentHash, StorageNamespace};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome of moving a finished upload into the raw namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub file_name: String,
    /// False when an identical file already sat under the digest name
    pub created: bool,
}

/// Port for the raw and final image file namespaces
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Absolute path of a stored file
    fn locate(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf;

    /// Absolute path of a stored file's thumbnail
    fn locate_thumb(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf;

    /// Directory new files of a namespace are written into
    fn namespace_dir(&self, namespace: StorageNamespace) -> PathBuf;

    /// Directory thumbnails of a namespace are written into
    fn thumb_dir(&self, namespace: StorageNamespace) -> PathBuf;

    async fn exists(&self, namespace: StorageNamespace, file_name: &str)
        -> Result<bool, StorageError>;

    /// SHA-256 of a completed upload's bytes
    async fn digest(&self, upload: &CompletedUpload) -> Result<ContentHash, StorageError>;

    /// Remove a completed upload that will not be kept
    async fn discard_upload(&self, upload: CompletedUpload) -> Result<(), StorageError>;

    /// Atomically rename a completed upload to `raw/<digest>.<ext>`
    async fn promote_upload(
        &self,
        upload: CompletedUpload,
        digest: &ContentHash,
    ) -> Result<Promotion, StorageError>;

    /// Remove a file and its thumbnail; missing files are not an error
    async fn delete(&self, namespace: StorageNamespace, file_name: &str)
        -> Result<(), StorageError>;
}

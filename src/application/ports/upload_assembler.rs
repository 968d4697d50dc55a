use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use serde::Serialize;
use thiserror::Error;

use super::StorageError;
use crate::domain::value_objects::UploadSessionKey;

/// One chunk as delivered by the upload transport
#[derive(Debug, Clone)]
pub struct ChunkSubmission {
    pub key: UploadSessionKey,
    pub index: u32,
    pub bytes: Bytes,
    pub is_final: bool,
    pub total_size: Option<u64>,
}

/// Result of feeding one chunk to the assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssemblyStatus {
    Incomplete,
    Complete {
        #[serde(rename = "fileName")]
        file_name: String,
    },
    Error {
        reason: String,
    },
}

impl AssemblyStatus {
    pub fn error(reason: &str) -> Self {
        AssemblyStatus::Error {
            reason: reason.to_string(),
        }
    }
}

/// A fully assembled upload waiting to be composed.
///
/// Only the assembler hands these out, so holding one proves every chunk
/// was written and the file was renamed to its final name.
#[derive(Debug, PartialEq, Eq)]
pub struct CompletedUpload {
    key: UploadSessionKey,
    path: PathBuf,
    extension: String,
    size: u64,
}

impl CompletedUpload {
    pub(crate) fn new(key: UploadSessionKey, path: PathBuf, extension: String, size: u64) -> Self {
        Self {
            key,
            path,
            extension,
            size,
        }
    }

    pub fn key(&self) -> &UploadSessionKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Error)]
pub enum TakeUploadError {
    #[error("Upload incomplete: {0}")]
    Incomplete(String),

    #[error("Unknown upload: {0}")]
    Unknown(String),
}

/// Port for chunked upload reassembly
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UploadAssembler: Send + Sync {
    async fn submit_chunk(&self, chunk: ChunkSubmission) -> AssemblyStatus;

    /// Hand a finished upload over to exactly one caller
    async fn take_completed(
        &self,
        key: &UploadSessionKey,
    ) -> Result<CompletedUpload, TakeUploadError>;

    /// Drop sessions and unclaimed uploads idle for longer than `max_idle`
    async fn reclaim_stale(&self, max_idle: Duration) -> Result<usize, StorageError>;
}

use std::sync::Arc;
use bytes::Bytes;
use thiserror::Error;

use crate::application::ports::{AssemblyStatus, ChunkSubmission, UploadAssembler};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{RequesterId, UploadSessionKey};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<DomainError> for UploadError {
    fn from(e: DomainError) -> Self {
        UploadError::InvalidRequest(e.to_string())
    }
}

/// Use case: feed one chunk of a background upload to the assembler
pub struct SubmitChunkUseCase {
    assembler: Arc<dyn UploadAssembler>,
}

impl SubmitChunkUseCase {
    pub fn new(assembler: Arc<dyn UploadAssembler>) -> Self {
        Self { assembler }
    }

    /// Chunk-level problems come back as `AssemblyStatus::Error`; only a
    /// malformed session key is an `Err`.
    pub async fn execute(
        &self,
        requester: RequesterId,
        file_name: &str,
        index: u32,
        bytes: Bytes,
        is_final: bool,
        total_size: Option<u64>,
    ) -> Result<AssemblyStatus, UploadError> {
        let key = UploadSessionKey::new(requester, file_name)?;
        let status = self
            .assembler
            .submit_chunk(ChunkSubmission {
                key,
                index,
                bytes,
                is_final,
                total_size,
            })
            .await;

        tracing::debug!(file = file_name, index, ?status, "chunk submitted");
        Ok(status)
    }
}

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::value_objects::UploadSessionKey;

/// Why a chunk was refused by an open session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkRejection {
    /// Index at or past the total announced by the final chunk
    BeyondTotal { index: u32, total: u32 },
    /// Index too far ahead of the first missing chunk
    OutsideWindow { index: u32, lowest_missing: u32 },
    /// Non-final chunk with the wrong length, or an oversized final chunk
    BadLength { index: u32, len: usize },
    /// A second final chunk disagreeing with the first
    ConflictingTotal { announced: u32, index: u32 },
    /// A final chunk placed before chunks that were already received
    FinalBeforeReceived { index: u32, highest: u32 },
}

/// In-progress chunk assembly for one (requester, file name) pair
#[derive(Debug)]
pub struct UploadSession {
    key: UploadSessionKey,
    temp_path: PathBuf,
    chunk_size: usize,
    received: BTreeSet<u32>,
    total_chunks: Option<u32>,
    final_chunk_len: Option<usize>,
    declared_size: Option<u64>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(key: UploadSessionKey, temp_path: PathBuf, chunk_size: usize) -> Self {
        let now = Utc::now();
        Self {
            key,
            temp_path,
            chunk_size,
            received: BTreeSet::new(),
            total_chunks: None,
            final_chunk_len: None,
            declared_size: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Check a chunk against what the session already knows
    pub fn check_chunk(
        &self,
        index: u32,
        len: usize,
        is_final: bool,
        window: u32,
    ) -> Result<(), ChunkRejection> {
        if let Some(total) = self.total_chunks {
            if index >= total {
                return Err(ChunkRejection::BeyondTotal { index, total });
            }
            if is_final && index + 1 != total {
                return Err(ChunkRejection::ConflictingTotal {
                    announced: total,
                    index,
                });
            }
        }

        if let Some(&highest) = self.received.last() {
            if is_final && index < highest {
                return Err(ChunkRejection::FinalBeforeReceived { index, highest });
            }
        }

        let lowest_missing = self.lowest_missing();
        if index > lowest_missing.saturating_add(window) {
            return Err(ChunkRejection::OutsideWindow {
                index,
                lowest_missing,
            });
        }

        let expects_full = !is_final && self.total_chunks.map_or(true, |t| index + 1 < t);
        if (expects_full && len != self.chunk_size) || len > self.chunk_size || len == 0 {
            return Err(ChunkRejection::BadLength { index, len });
        }

        Ok(())
    }

    /// Record a chunk that has been written to the temp file
    pub fn record_chunk(
        &mut self,
        index: u32,
        len: usize,
        is_final: bool,
        declared_size: Option<u64>,
    ) {
        self.received.insert(index);
        if is_final {
            self.total_chunks = Some(index + 1);
            self.final_chunk_len = Some(len);
        }
        if declared_size.is_some() {
            self.declared_size = declared_size;
        }
        self.last_activity = Utc::now();
    }

    /// Every chunk up to the announced total is present
    pub fn is_complete(&self) -> bool {
        match self.total_chunks {
            Some(total) => (0..total).all(|index| self.received.contains(&index)),
            None => false,
        }
    }

    /// First index not yet received
    pub fn lowest_missing(&self) -> u32 {
        let mut expected = 0;
        for index in &self.received {
            if *index != expected {
                break;
            }
            expected += 1;
        }
        expected
    }

    /// Size of the assembled file, known once the final chunk arrived
    pub fn assembled_size(&self) -> Option<u64> {
        let total = self.total_chunks?;
        let last = self.final_chunk_len?;
        Some((total as u64 - 1) * self.chunk_size as u64 + last as u64)
    }

    // Getters
    pub fn key(&self) -> &UploadSessionKey {
        &self.key
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn received_count(&self) -> usize {
        self.received.len()
    }

    pub fn total_chunks(&self) -> Option<u32> {
        self.total_chunks
    }

    pub fn declared_size(&self) -> Option<u64> {
        self.declared_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }
}

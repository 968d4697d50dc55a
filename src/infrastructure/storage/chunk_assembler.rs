use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::ports::{
    AssemblyStatus, ChunkSubmission, CompletedUpload, StorageError, TakeUploadError,
    UploadAssembler,
};
use crate::domain::entities::{ChunkRejection, UploadSession};
use crate::domain::value_objects::UploadSessionKey;
use crate::infrastructure::storage::PathBuilder;

/// Background formats accepted for upload, matched case-insensitively
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    /// Every chunk but the last is exactly this long
    pub chunk_size: usize,
    /// How far past the lowest missing index a chunk may arrive
    pub reorder_window: u32,
    pub max_upload_bytes: u64,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024,
            reorder_window: 64,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// An open session plus its temp path, readable without taking the lock
struct SessionSlot {
    temp_path: PathBuf,
    session: Arc<Mutex<UploadSession>>,
}

struct FinishedUpload {
    upload: CompletedUpload,
    finished_at: Instant,
}

/// Reassembles chunked uploads on the local filesystem.
///
/// Each chunk is written straight to its offset in `temp/<uuid>.part`, so
/// chunks may arrive in any order within the reorder window. Chunks of one
/// file are serialized by a per-session async mutex; different files do not
/// contend. When the last missing chunk lands the file is fsynced and
/// renamed into `complete/`, where it waits for exactly one composition to
/// take it.
pub struct LocalChunkAssembler {
    paths: PathBuilder,
    settings: AssemblerSettings,
    sessions: DashMap<UploadSessionKey, SessionSlot>,
    completed: DashMap<UploadSessionKey, FinishedUpload>,
}

impl LocalChunkAssembler {
    pub fn new(paths: PathBuilder, settings: AssemblerSettings) -> Self {
        Self {
            paths,
            settings,
            sessions: DashMap::new(),
            completed: DashMap::new(),
        }
    }

    /// Initialize upload directories
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.paths.upload_temp_dir()).await?;
        fs::create_dir_all(self.paths.upload_complete_dir()).await?;
        Ok(())
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn session_for(&self, key: &UploadSessionKey) -> Arc<Mutex<UploadSession>> {
        let entry = self.sessions.entry(key.clone()).or_insert_with(|| {
            let temp_path = self.paths.upload_temp_path(Uuid::new_v4());
            SessionSlot {
                session: Arc::new(Mutex::new(UploadSession::new(
                    key.clone(),
                    temp_path.clone(),
                    self.settings.chunk_size,
                ))),
                temp_path,
            }
        });
        Arc::clone(&entry.value().session)
    }

    fn exceeds_limit(&self, chunk: &ChunkSubmission) -> bool {
        let end = chunk.index as u64 * self.settings.chunk_size as u64 + chunk.bytes.len() as u64;
        end > self.settings.max_upload_bytes
            || chunk
                .total_size
                .is_some_and(|total| total > self.settings.max_upload_bytes)
    }

    async fn finalize(
        &self,
        session: &UploadSession,
        extension: String,
    ) -> Result<CompletedUpload, &'static str> {
        let key = session.key();
        let Some(size) = session.assembled_size() else {
            return Err("write_failed");
        };
        if let Some(declared) = session.declared_size() {
            if declared != size {
                warn!(upload = %key, declared, size, "assembled size differs from declared size");
                return Err("size_mismatch");
            }
        }

        let target = self.paths.upload_complete_path(Uuid::new_v4(), &extension);
        let settle = async {
            let file = OpenOptions::new().write(true).open(session.temp_path()).await?;
            file.set_len(size).await?;
            file.sync_all().await?;
            fs::rename(session.temp_path(), &target).await
        };
        if let Err(e) = settle.await {
            warn!(upload = %key, error = %e, "failed to finalize upload");
            return Err("write_failed");
        }

        Ok(CompletedUpload::new(key.clone(), target, extension, size))
    }

    fn drop_session(&self, key: &UploadSessionKey) {
        self.sessions.remove(key);
    }

    fn is_current(&self, key: &UploadSessionKey, handle: &Arc<Mutex<UploadSession>>) -> bool {
        self.sessions
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.value().session, handle))
    }
}

fn rejection_reason(rejection: &ChunkRejection) -> &'static str {
    match rejection {
        ChunkRejection::BeyondTotal { .. } => "chunk_out_of_range",
        ChunkRejection::OutsideWindow { .. } => "chunk_out_of_window",
        ChunkRejection::BadLength { .. } => "invalid_chunk_size",
        ChunkRejection::ConflictingTotal { .. } => "conflicting_final_chunk",
        ChunkRejection::FinalBeforeReceived { .. } => "chunk_out_of_range",
    }
}

/// Only the first chunk of a session may create the temp file; a later chunk
/// finding it gone fails instead of writing into a fresh, hole-filled file.
async fn write_at(path: &Path, offset: u64, bytes: &[u8], create: bool) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(create)
        .truncate(false)
        .write(true)
        .open(path)
        .await?;
    file.seek(SeekFrom::Start(offset)).await?;
    file.write_all(bytes).await?;
    file.flush().await
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove upload file");
        }
    }
}

/// Files in `dir` last modified before `cutoff` and not in `keep`
async fn stale_files(
    dir: &Path,
    cutoff: SystemTime,
    keep: &HashSet<PathBuf>,
) -> Result<Vec<PathBuf>, StorageError> {
    let mut stale = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stale),
        Err(e) => return Err(StorageError::Io(e)),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if keep.contains(&path) {
            continue;
        }
        let meta = entry.metadata().await?;
        if meta.is_file() && meta.modified().is_ok_and(|m| m < cutoff) {
            stale.push(path);
        }
    }
    Ok(stale)
}

#[async_trait]
impl UploadAssembler for LocalChunkAssembler {
    async fn submit_chunk(&self, chunk: ChunkSubmission) -> AssemblyStatus {
        let key = chunk.key.clone();
        let Some(extension) = key
            .extension()
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        else {
            return AssemblyStatus::error("invalid_image");
        };
        if self.completed.contains_key(&key) {
            return AssemblyStatus::error("upload_finalized");
        }
        if self.exceeds_limit(&chunk) {
            return AssemblyStatus::error("file_too_large");
        }

        let handle = self.session_for(&key);
        let mut session = handle.lock().await;

        // another chunk may have finished or aborted the file while this one waited
        if self.completed.contains_key(&key) {
            return AssemblyStatus::error("upload_finalized");
        }
        if !self.is_current(&key, &handle) {
            return AssemblyStatus::error("upload_aborted");
        }

        if let Err(rejection) = session.check_chunk(
            chunk.index,
            chunk.bytes.len(),
            chunk.is_final,
            self.settings.reorder_window,
        ) {
            debug!(upload = %key, ?rejection, "chunk rejected");
            return AssemblyStatus::error(rejection_reason(&rejection));
        }

        let offset = chunk.index as u64 * self.settings.chunk_size as u64;
        let first_chunk = session.received_count() == 0;
        if let Err(e) = write_at(session.temp_path(), offset, &chunk.bytes, first_chunk).await {
            warn!(upload = %key, index = chunk.index, error = %e, "failed to write chunk");
            return AssemblyStatus::error("write_failed");
        }
        session.record_chunk(
            chunk.index,
            chunk.bytes.len(),
            chunk.is_final,
            chunk.total_size,
        );

        if !session.is_complete() {
            return AssemblyStatus::Incomplete;
        }

        match self.finalize(&session, extension).await {
            Ok(upload) => {
                info!(upload = %key, size = upload.size(), "upload complete");
                self.completed.insert(
                    key.clone(),
                    FinishedUpload {
                        upload,
                        finished_at: Instant::now(),
                    },
                );
                self.drop_session(&key);
                AssemblyStatus::Complete {
                    file_name: key.file_name().to_string(),
                }
            }
            Err(reason) => {
                remove_quietly(session.temp_path()).await;
                self.drop_session(&key);
                AssemblyStatus::error(reason)
            }
        }
    }

    async fn take_completed(
        &self,
        key: &UploadSessionKey,
    ) -> Result<CompletedUpload, TakeUploadError> {
        if let Some((_, finished)) = self.completed.remove(key) {
            return Ok(finished.upload);
        }
        if self.sessions.contains_key(key) {
            Err(TakeUploadError::Incomplete(key.to_string()))
        } else {
            Err(TakeUploadError::Unknown(key.to_string()))
        }
    }

    async fn reclaim_stale(&self, max_idle: Duration) -> Result<usize, StorageError> {
        let idle = chrono::Duration::from_std(max_idle)
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        let session_cutoff = chrono::Utc::now() - idle;

        // sessions currently receiving a chunk are busy, not stale
        let idle_sessions: Vec<(UploadSessionKey, Arc<Mutex<UploadSession>>)> = self
            .sessions
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .session
                    .try_lock()
                    .is_ok_and(|session| session.last_activity() < session_cutoff)
            })
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.value().session)))
            .collect();

        let stale_uploads: Vec<UploadSessionKey> = self
            .completed
            .iter()
            .filter(|entry| entry.value().finished_at.elapsed() > max_idle)
            .map(|entry| entry.key().clone())
            .collect();

        let mut reclaimed = 0;
        for (key, handle) in idle_sessions {
            // a chunk may have landed since the scan; decide again under the lock
            let session = handle.lock().await;
            if session.last_activity() >= session_cutoff || !self.is_current(&key, &handle) {
                continue;
            }
            self.sessions.remove(&key);
            remove_quietly(session.temp_path()).await;
            debug!(upload = %key, "reclaimed idle upload session");
            reclaimed += 1;
        }
        for key in stale_uploads {
            if let Some((_, finished)) = self.completed.remove(&key) {
                remove_quietly(finished.upload.path()).await;
                debug!(upload = %key, "reclaimed unclaimed upload");
                reclaimed += 1;
            }
        }

        // leftovers from a previous process are not tracked in memory; every
        // session still in the map keeps its temp file, busy or not
        let mut tracked: HashSet<PathBuf> = self
            .sessions
            .iter()
            .map(|entry| entry.value().temp_path.clone())
            .collect();
        for entry in self.completed.iter() {
            tracked.insert(entry.value().upload.path().to_path_buf());
        }
        let cutoff = SystemTime::now()
            .checked_sub(max_idle)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        for dir in [self.paths.upload_temp_dir(), self.paths.upload_complete_dir()] {
            for path in stale_files(&dir, cutoff, &tracked).await? {
                remove_quietly(&path).await;
                reclaimed += 1;
            }
        }

        Ok(reclaimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::RequesterId;
    use bytes::Bytes;
    use tempfile::TempDir;

    const CHUNK: usize = 4;

    async fn assembler(dir: &TempDir) -> LocalChunkAssembler {
        let assembler = LocalChunkAssembler::new(
            PathBuilder::new(dir.path().join("data"), dir.path().join("uploads")),
            AssemblerSettings {
                chunk_size: CHUNK,
                reorder_window: 4,
                max_upload_bytes: 64,
            },
        );
        assembler.init().await.unwrap();
        assembler
    }

    fn key(name: &str) -> UploadSessionKey {
        UploadSessionKey::new(RequesterId::new(uuid::Uuid::new_v4()), name).unwrap()
    }

    fn chunk(
        key: &UploadSessionKey,
        index: u32,
        data: &'static [u8],
        is_final: bool,
    ) -> ChunkSubmission {
        ChunkSubmission {
            key: key.clone(),
            index,
            bytes: Bytes::from_static(data),
            is_final,
            total_size: None,
        }
    }

    #[tokio::test]
    async fn test_reverse_order_chunks_assemble() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("photo.JPG");

        assert_eq!(
            assembler.submit_chunk(chunk(&key, 2, b"ij", true)).await,
            AssemblyStatus::Incomplete
        );
        assert_eq!(
            assembler.submit_chunk(chunk(&key, 1, b"efgh", false)).await,
            AssemblyStatus::Incomplete
        );
        assert!(matches!(
            assembler.take_completed(&key).await,
            Err(TakeUploadError::Incomplete(_))
        ));
        assert_eq!(
            assembler.submit_chunk(chunk(&key, 0, b"abcd", false)).await,
            AssemblyStatus::Complete {
                file_name: "photo.JPG".to_string()
            }
        );

        let upload = assembler.take_completed(&key).await.unwrap();
        assert_eq!(upload.extension(), "jpg");
        assert_eq!(upload.size(), 10);
        assert_eq!(fs::read(upload.path()).await.unwrap(), b"abcdefghij");
        assert!(upload.path().starts_with(dir.path().join("uploads").join("complete")));

        // consumed exactly once
        assert!(matches!(
            assembler.take_completed(&key).await,
            Err(TakeUploadError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn test_late_chunk_after_completion_is_rejected() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("a.png");

        assembler.submit_chunk(chunk(&key, 0, b"ab", true)).await;
        assert_eq!(
            assembler.submit_chunk(chunk(&key, 0, b"ab", true)).await,
            AssemblyStatus::error("upload_finalized")
        );
    }

    #[tokio::test]
    async fn test_invalid_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;

        assert_eq!(
            assembler.submit_chunk(chunk(&key("notes.txt"), 0, b"ab", true)).await,
            AssemblyStatus::error("invalid_image")
        );
        assert_eq!(assembler.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_size_limits() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("big.webp");

        let mut declared = chunk(&key, 0, b"abcd", false);
        declared.total_size = Some(1000);
        assert_eq!(
            assembler.submit_chunk(declared).await,
            AssemblyStatus::error("file_too_large")
        );
        assert_eq!(
            assembler.submit_chunk(chunk(&key, 16, b"ab", true)).await,
            AssemblyStatus::error("file_too_large")
        );
    }

    #[tokio::test]
    async fn test_short_non_final_chunk_is_rejected() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("a.gif");

        assert_eq!(
            assembler.submit_chunk(chunk(&key, 0, b"ab", false)).await,
            AssemblyStatus::error("invalid_chunk_size")
        );
        assert_eq!(
            assembler.submit_chunk(chunk(&key, 9, b"abcd", false)).await,
            AssemblyStatus::error("chunk_out_of_window")
        );
    }

    #[tokio::test]
    async fn test_declared_size_mismatch_discards_upload() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("a.png");

        let mut last = chunk(&key, 0, b"abc", true);
        last.total_size = Some(5);
        assert_eq!(
            assembler.submit_chunk(last).await,
            AssemblyStatus::error("size_mismatch")
        );
        assert!(matches!(
            assembler.take_completed(&key).await,
            Err(TakeUploadError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn test_reclaim_spares_session_receiving_a_chunk() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("busy.png");

        assembler.submit_chunk(chunk(&key, 0, b"abcd", false)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let handle = assembler.session_for(&key);
        let temp_path = {
            // hold the lock the way an in-flight chunk would
            let session = handle.lock().await;
            let reclaimed = assembler
                .reclaim_stale(Duration::from_millis(10))
                .await
                .unwrap();
            assert_eq!(reclaimed, 0);
            session.temp_path().to_path_buf()
        };
        assert!(temp_path.exists());

        assert_eq!(
            assembler.submit_chunk(chunk(&key, 1, b"ef", true)).await,
            AssemblyStatus::Complete {
                file_name: "busy.png".to_string()
            }
        );
        let upload = assembler.take_completed(&key).await.unwrap();
        assert_eq!(fs::read(upload.path()).await.unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_chunk_after_temp_file_vanished_fails() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let key = key("gone.png");

        assembler.submit_chunk(chunk(&key, 0, b"abcd", false)).await;
        let temp_path = assembler
            .session_for(&key)
            .lock()
            .await
            .temp_path()
            .to_path_buf();
        fs::remove_file(&temp_path).await.unwrap();

        assert_eq!(
            assembler.submit_chunk(chunk(&key, 1, b"ef", true)).await,
            AssemblyStatus::error("write_failed")
        );
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn test_reclaim_stale_sessions_and_uploads() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir).await;
        let open = key("open.png");
        let done = key("done.png");

        assembler.submit_chunk(chunk(&open, 0, b"abcd", false)).await;
        assembler.submit_chunk(chunk(&done, 0, b"ab", true)).await;

        assert_eq!(assembler.reclaim_stale(Duration::from_secs(3600)).await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let reclaimed = assembler.reclaim_stale(Duration::from_millis(1)).await.unwrap();

        assert_eq!(reclaimed, 2);
        assert_eq!(assembler.open_sessions(), 0);
        assert!(matches!(
            assembler.take_completed(&done).await,
            Err(TakeUploadError::Unknown(_))
        ));
    }
}

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::application::errors::ComposeError;
use crate::application::ports::{CompletedUpload, ImageRepository, ImageStore, StorageError};
use crate::domain::entities::RawImage;
use crate::domain::value_objects::{ContentHash, StorageNamespace};

/// Outcome of checking a fresh upload against stored backgrounds
#[derive(Debug)]
pub enum Resolution {
    /// Same bytes already stored; the upload has been deleted
    Duplicate(RawImage),
    /// Nothing matched; the upload is handed back to become a new raw image
    New(CompletedUpload),
}

/// Per-digest locks held from the dedup lookup until the composition is
/// recorded or its fresh raw file removed.
///
/// Inside one process, a second identical upload waits for the first to
/// finish, then either finds its record or promotes the bytes again. It
/// never shares a raw file the first request might still delete.
#[derive(Default)]
pub struct DigestLocks {
    held: DashMap<ContentHash, Arc<Mutex<()>>>,
}

/// Releases the digest when dropped
pub struct DigestGuard<'a> {
    locks: &'a DigestLocks,
    digest: ContentHash,
    _guard: OwnedMutexGuard<()>,
}

impl DigestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, digest: &ContentHash) -> DigestGuard<'_> {
        let mutex = Arc::clone(
            self.held
                .entry(digest.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        if mutex.try_lock().is_err() {
            debug!(digest = %digest, "waiting for identical upload in flight");
        }
        DigestGuard {
            locks: self,
            digest: digest.clone(),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Digests currently locked or waited on
    pub fn in_flight(&self) -> usize {
        self.held.len()
    }
}

impl Drop for DigestGuard<'_> {
    fn drop(&mut self) {
        // the map and this guard hold the only references when nobody waits
        self.locks
            .held
            .remove_if(&self.digest, |_, mutex| Arc::strong_count(mutex) <= 2);
    }
}

/// Exact-digest reuse of stored backgrounds.
///
/// This is a point-in-time lookup. Two identical uploads racing each other
/// may both come back as `New` unless the caller holds a [`DigestLocks`]
/// guard; across processes the race remains.
pub struct Deduplicator {
    repository: Arc<dyn ImageRepository>,
    store: Arc<dyn ImageStore>,
}

impl Deduplicator {
    pub fn new(repository: Arc<dyn ImageRepository>, store: Arc<dyn ImageStore>) -> Self {
        Self { repository, store }
    }

    /// Hash a completed upload
    pub async fn digest(&self, upload: &CompletedUpload) -> Result<ContentHash, ComposeError> {
        self.store.digest(upload).await.map_err(|e| match e {
            StorageError::NotFound(_) | StorageError::Io(_) => {
                ComposeError::DuplicateResolution(format!("{}: {}", upload.key(), e))
            }
            other => ComposeError::Storage(other),
        })
    }

    pub async fn resolve(
        &self,
        upload: CompletedUpload,
        digest: &ContentHash,
    ) -> Result<Resolution, ComposeError> {
        let Some(existing) = self.repository.find_by_digest(digest).await? else {
            return Ok(Resolution::New(upload));
        };

        if !self
            .store
            .exists(StorageNamespace::Raw, existing.file_name())
            .await?
        {
            warn!(
                raw_id = %existing.id(),
                file = existing.file_name(),
                "raw image record has no backing file, storing upload as new"
            );
            return Ok(Resolution::New(upload));
        }

        info!(raw_id = %existing.id(), digest = %digest, "reusing stored background");
        self.store.discard_upload(upload).await?;
        Ok(Resolution::Duplicate(existing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockImageRepository, MockImageStore};
    use crate::domain::value_objects::{RequesterId, UploadSessionKey};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn upload() -> CompletedUpload {
        let key = UploadSessionKey::new(RequesterId::new(Uuid::new_v4()), "a.png").unwrap();
        CompletedUpload::new(key, PathBuf::from("/tmp/a.png"), "png".to_string(), 10)
    }

    fn digest() -> ContentHash {
        ContentHash::from_hex("d".repeat(64)).unwrap()
    }

    fn stored() -> RawImage {
        RawImage::new(
            digest().raw_file_name("png"),
            digest(),
            RequesterId::new(Uuid::new_v4()),
            10,
            10,
            vec![],
        )
    }

    #[tokio::test]
    async fn test_digest_lock_serializes_and_cleans_up() {
        let locks = Arc::new(DigestLocks::new());
        let first = locks.lock(&digest()).await;
        assert_eq!(locks.in_flight(), 1);

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _second = locks.lock(&digest()).await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_digests_do_not_wait() {
        let locks = DigestLocks::new();
        let other = ContentHash::from_hex("e".repeat(64)).unwrap();

        let _first = locks.lock(&digest()).await;
        let _second = locks.lock(&other).await;
        assert_eq!(locks.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_no_match_returns_upload() {
        let mut repo = MockImageRepository::new();
        repo.expect_find_by_digest().returning(|_| Ok(None));
        let store = MockImageStore::new();

        let dedup = Deduplicator::new(Arc::new(repo), Arc::new(store));
        let resolution = dedup.resolve(upload(), &digest()).await.unwrap();

        assert!(matches!(resolution, Resolution::New(_)));
    }

    #[tokio::test]
    async fn test_match_discards_upload() {
        let existing = stored();
        let existing_id = existing.id();
        let mut repo = MockImageRepository::new();
        repo.expect_find_by_digest()
            .returning(move |_| Ok(Some(existing.clone())));
        let mut store = MockImageStore::new();
        store.expect_exists().returning(|_, _| Ok(true));
        store.expect_discard_upload().times(1).returning(|_| Ok(()));

        let dedup = Deduplicator::new(Arc::new(repo), Arc::new(store));
        let resolution = dedup.resolve(upload(), &digest()).await.unwrap();

        match resolution {
            Resolution::Duplicate(raw) => assert_eq!(raw.id(), existing_id),
            other => panic!("expected duplicate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_match_without_file_is_treated_as_new() {
        let existing = stored();
        let mut repo = MockImageRepository::new();
        repo.expect_find_by_digest()
            .returning(move |_| Ok(Some(existing.clone())));
        let mut store = MockImageStore::new();
        store.expect_exists().returning(|_, _| Ok(false));
        store.expect_discard_upload().never();

        let dedup = Deduplicator::new(Arc::new(repo), Arc::new(store));
        let resolution = dedup.resolve(upload(), &digest()).await.unwrap();

        assert!(matches!(resolution, Resolution::New(_)));
    }

    #[tokio::test]
    async fn test_missing_file_at_hash_time() {
        let mut store = MockImageStore::new();
        store
            .expect_digest()
            .returning(|_| Err(StorageError::NotFound("gone".to_string())));

        let dedup = Deduplicator::new(Arc::new(MockImageRepository::new()), Arc::new(store));
        let err = dedup.digest(&upload()).await.unwrap_err();

        assert!(matches!(err, ComposeError::DuplicateResolution(_)));
    }
}

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tracing::{debug, warn};

use crate::application::ports::{CompletedUpload, ImageStore, Promotion, StorageError};
use crate::domain::value_objects::{ContentHash, StorageNamespace};
use crate::infrastructure::storage::{ContentHasher, PathBuilder};

/// Image files on the local filesystem.
///
/// Raw backgrounds live at `raw/<digest>.<ext>`, composited images at
/// `final/<uuid>.<ext>`, each with a `thumbs/` directory beside them.
pub struct LocalImageStore {
    path_builder: PathBuilder,
    durable_writes: bool,
}

impl LocalImageStore {
    pub fn new(path_builder: PathBuilder) -> Self {
        Self::with_durability(path_builder, true)
    }

    pub fn with_durability(path_builder: PathBuilder, durable_writes: bool) -> Self {
        Self {
            path_builder,
            durable_writes,
        }
    }

    /// Initialize storage directories
    pub async fn init(&self) -> Result<(), StorageError> {
        for namespace in [StorageNamespace::Raw, StorageNamespace::Final] {
            fs::create_dir_all(self.path_builder.thumb_dir(namespace)).await?;
        }
        Ok(())
    }

    async fn sync_parent(&self, path: &Path) {
        if !self.durable_writes {
            return;
        }
        if let Some(parent) = path.parent() {
            match File::open(parent).await {
                Ok(dir) => {
                    if let Err(e) = dir.sync_all().await {
                        warn!("Failed to sync parent directory after rename: {}", e);
                    }
                }
                Err(e) => warn!("Failed to open parent directory for sync: {}", e),
            }
        }
    }
}

/// Remove a file, treating "already gone" as success
async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    fn locate(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf {
        self.path_builder.file_path(namespace, file_name)
    }

    fn locate_thumb(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf {
        self.path_builder.thumb_path(namespace, file_name)
    }

    fn namespace_dir(&self, namespace: StorageNamespace) -> PathBuf {
        self.path_builder.namespace_dir(namespace)
    }

    fn thumb_dir(&self, namespace: StorageNamespace) -> PathBuf {
        self.path_builder.thumb_dir(namespace)
    }

    async fn exists(
        &self,
        namespace: StorageNamespace,
        file_name: &str,
    ) -> Result<bool, StorageError> {
        match fs::metadata(self.path_builder.file_path(namespace, file_name)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn digest(&self, upload: &CompletedUpload) -> Result<ContentHash, StorageError> {
        ContentHasher::hash_file(upload.path()).await
    }

    async fn discard_upload(&self, upload: CompletedUpload) -> Result<(), StorageError> {
        debug!(upload = %upload.key(), "discarding upload");
        remove_if_present(upload.path()).await
    }

    async fn promote_upload(
        &self,
        upload: CompletedUpload,
        digest: &ContentHash,
    ) -> Result<Promotion, StorageError> {
        let file_name = digest.raw_file_name(upload.extension());
        let target = self.path_builder.file_path(StorageNamespace::Raw, &file_name);

        if fs::metadata(&target).await.is_ok() {
            // identical bytes promoted by a concurrent request
            debug!(file = %file_name, "raw file already present, dropping upload");
            remove_if_present(upload.path()).await?;
            return Ok(Promotion {
                file_name,
                created: false,
            });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(upload.path(), &target).await {
            let _ = fs::remove_file(upload.path()).await;
            return Err(StorageError::Io(e));
        }
        self.sync_parent(&target).await;

        debug!(file = %file_name, "upload promoted to raw namespace");
        Ok(Promotion {
            file_name,
            created: true,
        })
    }

    async fn delete(
        &self,
        namespace: StorageNamespace,
        file_name: &str,
    ) -> Result<(), StorageError> {
        remove_if_present(&self.path_builder.file_path(namespace, file_name)).await?;
        remove_if_present(&self.path_builder.thumb_path(namespace, file_name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{RequesterId, UploadSessionKey};
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn store(dir: &TempDir) -> LocalImageStore {
        let store = LocalImageStore::with_durability(
            PathBuilder::new(dir.path().join("data"), dir.path().join("uploads")),
            false,
        );
        store.init().await.unwrap();
        store
    }

    async fn upload(dir: &TempDir, name: &str, content: &[u8]) -> CompletedUpload {
        let path = dir.path().join(format!("{}-{}", Uuid::new_v4(), name));
        fs::write(&path, content).await.unwrap();
        let key = UploadSessionKey::new(RequesterId::new(Uuid::new_v4()), name).unwrap();
        CompletedUpload::new(key, path, "png".to_string(), content.len() as u64)
    }

    #[tokio::test]
    async fn test_store_init_creates_directories() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        assert!(store.thumb_dir(StorageNamespace::Raw).is_dir());
        assert!(store.thumb_dir(StorageNamespace::Final).is_dir());
    }

    #[tokio::test]
    async fn test_promote_renames_to_digest_name() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let upload = upload(&dir, "a.png", b"pixels").await;
        let source = upload.path().to_path_buf();

        let digest = store.digest(&upload).await.unwrap();
        let promotion = store.promote_upload(upload, &digest).await.unwrap();

        assert!(promotion.created);
        assert_eq!(promotion.file_name, format!("{}.png", digest.as_hex()));
        assert!(!source.exists());
        assert!(store.exists(StorageNamespace::Raw, &promotion.file_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_promote_same_bytes_twice_keeps_one_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let first = upload(&dir, "a.png", b"same").await;
        let second = upload(&dir, "b.png", b"same").await;
        let second_path = second.path().to_path_buf();

        let digest = store.digest(&first).await.unwrap();
        assert!(store.promote_upload(first, &digest).await.unwrap().created);
        let again = store.promote_upload(second, &digest).await.unwrap();

        assert!(!again.created);
        assert!(!second_path.exists());
    }

    #[tokio::test]
    async fn test_delete_removes_thumb_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        fs::write(store.locate(StorageNamespace::Final, "x.jpg"), b"x")
            .await
            .unwrap();
        fs::write(store.locate_thumb(StorageNamespace::Final, "x.jpg"), b"t")
            .await
            .unwrap();

        store.delete(StorageNamespace::Final, "x.jpg").await.unwrap();

        assert!(!store.exists(StorageNamespace::Final, "x.jpg").await.unwrap());
        assert!(!store.locate_thumb(StorageNamespace::Final, "x.jpg").exists());
        store.delete(StorageNamespace::Final, "x.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_digest_of_vanished_upload() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let upload = upload(&dir, "a.png", b"gone").await;
        fs::remove_file(upload.path()).await.unwrap();

        assert!(matches!(
            store.digest(&upload).await,
            Err(StorageError::NotFound(_))
        ));
    }
}

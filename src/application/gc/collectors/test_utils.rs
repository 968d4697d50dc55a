use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::application::ports::{CompletedUpload, ImageStore, Promotion, StorageError};
use crate::domain::entities::{CompositionMeta, FinalImage, RawImage};
use crate::domain::value_objects::{ContentHash, OriginalRef, RequesterId, StorageNamespace};
use uuid::Uuid;

pub fn sample_raw(file_name: &str) -> RawImage {
    RawImage::reconstruct(
        crate::domain::value_objects::ImageId::new(),
        file_name.to_string(),
        ContentHash::from_hex(format!("{:064x}", file_name.len())).unwrap(),
        RequesterId::new(Uuid::new_v4()),
        10,
        10,
        vec![],
        None,
        chrono::Utc::now(),
    )
}

pub fn sample_final(file_name: &str) -> FinalImage {
    FinalImage::new(
        file_name.to_string(),
        file_name.to_string(),
        OriginalRef::Gradient,
        CompositionMeta {
            width: 10,
            height: 10,
            zoom: 1.0,
            border: "none".to_string(),
            logo: None,
            bar_texts: vec![],
            copyright: None,
        },
        RequesterId::new(Uuid::new_v4()),
    )
}

/// Store that only knows which files exist
#[derive(Default)]
pub struct FakeImageStore {
    files: Mutex<HashSet<(StorageNamespace, String)>>,
    deleted: Mutex<Vec<(StorageNamespace, String)>>,
    failing: Option<String>,
}

impl FakeImageStore {
    pub fn with_files(files: &[(StorageNamespace, &str)]) -> Self {
        Self {
            files: Mutex::new(files.iter().map(|(ns, f)| (*ns, f.to_string())).collect()),
            ..Self::default()
        }
    }

    pub fn failing_on(file_name: &str) -> Self {
        Self {
            failing: Some(file_name.to_string()),
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<(StorageNamespace, String)> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    fn locate(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf {
        PathBuf::from(namespace.dir_name()).join(file_name)
    }

    fn locate_thumb(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf {
        PathBuf::from(namespace.dir_name()).join("thumbs").join(file_name)
    }

    fn namespace_dir(&self, namespace: StorageNamespace) -> PathBuf {
        PathBuf::from(namespace.dir_name())
    }

    fn thumb_dir(&self, namespace: StorageNamespace) -> PathBuf {
        PathBuf::from(namespace.dir_name()).join("thumbs")
    }

    async fn exists(
        &self,
        namespace: StorageNamespace,
        file_name: &str,
    ) -> Result<bool, StorageError> {
        if self.failing.as_deref() == Some(file_name) {
            return Err(StorageError::Internal("permission denied".to_string()));
        }
        Ok(self
            .files
            .lock()
            .contains(&(namespace, file_name.to_string())))
    }

    async fn digest(&self, _upload: &CompletedUpload) -> Result<ContentHash, StorageError> {
        unimplemented!("Not needed for GC collector tests")
    }

    async fn discard_upload(&self, _upload: CompletedUpload) -> Result<(), StorageError> {
        unimplemented!("Not needed for GC collector tests")
    }

    async fn promote_upload(
        &self,
        _upload: CompletedUpload,
        _digest: &ContentHash,
    ) -> Result<Promotion, StorageError> {
        unimplemented!("Not needed for GC collector tests")
    }

    async fn delete(
        &self,
        namespace: StorageNamespace,
        file_name: &str,
    ) -> Result<(), StorageError> {
        self.files.lock().remove(&(namespace, file_name.to_string()));
        self.deleted.lock().push((namespace, file_name.to_string()));
        Ok(())
    }
}

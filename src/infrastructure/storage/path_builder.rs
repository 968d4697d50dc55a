use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::domain::value_objects::StorageNamespace;

const THUMBS_DIR: &str = "thumbs";

/// Utility for generating storage paths
#[derive(Debug, Clone)]
pub struct PathBuilder {
    storage_root: PathBuf,
    upload_root: PathBuf,
}

impl PathBuilder {
    pub fn new(storage_root: PathBuf, upload_root: PathBuf) -> Self {
        Self {
            storage_root,
            upload_root,
        }
    }

    /// /root/{raw|final}
    pub fn namespace_dir(&self, namespace: StorageNamespace) -> PathBuf {
        self.storage_root.join(namespace.dir_name())
    }

    /// /root/{raw|final}/thumbs
    pub fn thumb_dir(&self, namespace: StorageNamespace) -> PathBuf {
        self.namespace_dir(namespace).join(THUMBS_DIR)
    }

    pub fn file_path(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf {
        self.namespace_dir(namespace).join(file_name)
    }

    pub fn thumb_path(&self, namespace: StorageNamespace, file_name: &str) -> PathBuf {
        self.thumb_dir(namespace).join(file_name)
    }

    pub fn upload_temp_dir(&self) -> PathBuf {
        self.upload_root.join("temp")
    }

    pub fn upload_complete_dir(&self) -> PathBuf {
        self.upload_root.join("complete")
    }

    /// Partial upload: /uploads/temp/{uuid}.part
    pub fn upload_temp_path(&self, id: Uuid) -> PathBuf {
        self.upload_temp_dir().join(format!("{}.part", id))
    }

    /// Assembled upload: /uploads/complete/{uuid}.{ext}
    pub fn upload_complete_path(&self, id: Uuid, extension: &str) -> PathBuf {
        self.upload_complete_dir()
            .join(format!("{}.{}", id, extension))
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }
}

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{FinalImage, LegalInfo, RawImage};
use crate::domain::value_objects::{ContentHash, ImageId};
#[cfg(test)]
use mockall::{automock, predicate::*};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Either kind of stored image
#[derive(Debug, Clone)]
pub enum ImageRecord {
    Raw(RawImage),
    Final(FinalImage),
}

impl ImageRecord {
    pub fn id(&self) -> ImageId {
        match self {
            ImageRecord::Raw(raw) => raw.id(),
            ImageRecord::Final(image) => image.id(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            ImageRecord::Raw(raw) => raw.file_name(),
            ImageRecord::Final(image) => image.file_name(),
        }
    }
}

/// Port for the image record store
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn get(&self, id: &ImageId) -> Result<Option<ImageRecord>, RepositoryError>;

    async fn insert_raw_image(&self, image: &RawImage) -> Result<ImageId, RepositoryError>;

    async fn insert_final_image(&self, image: &FinalImage) -> Result<ImageId, RepositoryError>;

    /// Oldest raw image with exactly this digest
    async fn find_by_digest(
        &self,
        digest: &ContentHash,
    ) -> Result<Option<RawImage>, RepositoryError>;

    async fn delete(&self, id: &ImageId) -> Result<(), RepositoryError>;

    /// Keyset page over every record ordered by id, for maintenance sweeps
    async fn list_page(
        &self,
        after: Option<ImageId>,
        limit: i64,
    ) -> Result<Vec<ImageRecord>, RepositoryError>;

    async fn append_bar_texts(
        &self,
        id: &ImageId,
        texts: &[String],
    ) -> Result<(), RepositoryError>;

    async fn update_legal(&self, id: &ImageId, legal: &LegalInfo) -> Result<(), RepositoryError>;
}

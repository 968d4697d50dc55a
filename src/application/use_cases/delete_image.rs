use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::dto::{DeleteResponse, Requester};
use crate::application::ports::{
    ImageRecord, ImageRepository, ImageStore, RepositoryError, StorageError,
};
use crate::domain::value_objects::{ImageId, StorageNamespace};

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Not allowed to delete image {0}")]
    Forbidden(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Use case: Delete a final image and its files
pub struct DeleteImageUseCase {
    repository: Arc<dyn ImageRepository>,
    store: Arc<dyn ImageStore>,
}

impl DeleteImageUseCase {
    pub fn new(repository: Arc<dyn ImageRepository>, store: Arc<dyn ImageStore>) -> Self {
        Self { repository, store }
    }

    /// Execute delete workflow
    pub async fn execute(
        &self,
        requester: Requester,
        image_id: &ImageId,
    ) -> Result<DeleteResponse, DeleteError> {
        // 1. Find image
        let image = match self.repository.get(image_id).await? {
            Some(ImageRecord::Final(image)) => image,
            // raw backgrounds are shared between compositions
            Some(ImageRecord::Raw(_)) => return Err(DeleteError::Forbidden(image_id.to_string())),
            None => return Err(DeleteError::NotFound(image_id.to_string())),
        };

        // 2. Owner or super admin only
        if !image.may_delete(requester.id, requester.is_super_admin) {
            return Err(DeleteError::Forbidden(image_id.to_string()));
        }

        // 3. Record first, so a half-finished delete leaves at worst an orphaned file
        self.repository.delete(image_id).await?;

        // 4. Files
        if let Err(e) = self
            .store
            .delete(StorageNamespace::Final, image.file_name())
            .await
        {
            warn!(image_id = %image_id, error = %e, "record deleted but files remain");
            return Err(e.into());
        }

        info!(image_id = %image_id, requester = %requester.id, "image deleted");
        Ok(DeleteResponse {
            success: true,
            message: "Image deleted".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockImageRepository, MockImageStore};
    use crate::domain::entities::{CompositionMeta, FinalImage, RawImage};
    use crate::domain::value_objects::{ContentHash, OriginalRef, RequesterId};
    use uuid::Uuid;

    fn final_image(owner: RequesterId) -> FinalImage {
        FinalImage::new(
            "out.jpg".to_string(),
            "out.jpg".to_string(),
            OriginalRef::Gradient,
            CompositionMeta {
                width: 100,
                height: 50,
                zoom: 1.0,
                border: "none".to_string(),
                logo: None,
                bar_texts: vec![],
                copyright: None,
            },
            owner,
        )
    }

    fn requester(id: RequesterId, is_super_admin: bool) -> Requester {
        Requester { id, is_super_admin }
    }

    #[tokio::test]
    async fn test_delete_image_happy_path() {
        let owner = RequesterId::new(Uuid::new_v4());
        let image = final_image(owner);
        let image_id = image.id();

        let mut repo = MockImageRepository::new();
        repo.expect_get()
            .withf(move |id| id == &image_id)
            .times(1)
            .returning(move |_| Ok(Some(ImageRecord::Final(image.clone()))));
        repo.expect_delete().times(1).returning(|_| Ok(()));

        let mut store = MockImageStore::new();
        store
            .expect_delete()
            .withf(|ns, name| *ns == StorageNamespace::Final && name == "out.jpg")
            .times(1)
            .returning(|_, _| Ok(()));

        let use_case = DeleteImageUseCase::new(Arc::new(repo), Arc::new(store));
        let response = use_case
            .execute(requester(owner, false), &image_id)
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.message, "Image deleted");
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_forbidden() {
        let image = final_image(RequesterId::new(Uuid::new_v4()));
        let image_id = image.id();

        let mut repo = MockImageRepository::new();
        repo.expect_get()
            .returning(move |_| Ok(Some(ImageRecord::Final(image.clone()))));
        repo.expect_delete().never();

        let use_case = DeleteImageUseCase::new(Arc::new(repo), Arc::new(MockImageStore::new()));
        let result = use_case
            .execute(requester(RequesterId::new(Uuid::new_v4()), false), &image_id)
            .await;

        assert!(matches!(result, Err(DeleteError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_super_admin_may_delete_any_image() {
        let image = final_image(RequesterId::new(Uuid::new_v4()));
        let image_id = image.id();

        let mut repo = MockImageRepository::new();
        repo.expect_get()
            .returning(move |_| Ok(Some(ImageRecord::Final(image.clone()))));
        repo.expect_delete().times(1).returning(|_| Ok(()));
        let mut store = MockImageStore::new();
        store.expect_delete().times(1).returning(|_, _| Ok(()));

        let use_case = DeleteImageUseCase::new(Arc::new(repo), Arc::new(store));
        let result = use_case
            .execute(requester(RequesterId::new(Uuid::new_v4()), true), &image_id)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_raw_images_cannot_be_deleted() {
        let owner = RequesterId::new(Uuid::new_v4());
        let digest = ContentHash::from_hex("a".repeat(64)).unwrap();
        let raw = RawImage::new(digest.raw_file_name("jpg"), digest, owner, 10, 10, vec![]);
        let raw_id = raw.id();

        let mut repo = MockImageRepository::new();
        repo.expect_get()
            .returning(move |_| Ok(Some(ImageRecord::Raw(raw.clone()))));
        repo.expect_delete().never();

        let use_case = DeleteImageUseCase::new(Arc::new(repo), Arc::new(MockImageStore::new()));
        let result = use_case.execute(requester(owner, true), &raw_id).await;

        assert!(matches!(result, Err(DeleteError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_image() {
        let mut repo = MockImageRepository::new();
        repo.expect_get().returning(|_| Ok(None));

        let use_case = DeleteImageUseCase::new(Arc::new(repo), Arc::new(MockImageStore::new()));
        let result = use_case
            .execute(requester(RequesterId::new(Uuid::new_v4()), true), &ImageId::new())
            .await;

        assert!(matches!(result, Err(DeleteError::NotFound(_))));
    }
}

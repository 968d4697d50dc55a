use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::application::dto::{LegalOutcome, LegalRequest, Requester};
use crate::application::ports::{ImageRecord, ImageRepository, RepositoryError};
use crate::application::validation::validate_legal;
use crate::domain::entities::LegalInfo;
use crate::domain::value_objects::ImageId;

#[derive(Debug, Error)]
pub enum LegalError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Use case: attach photographer and license to a raw background.
///
/// The id may name a final image; its raw original is updated then.
/// Only whoever uploaded the background first may overwrite the info,
/// anyone else gets [`LegalOutcome::KeptExisting`].
pub struct AddLegalUseCase {
    repository: Arc<dyn ImageRepository>,
}

impl AddLegalUseCase {
    pub fn new(repository: Arc<dyn ImageRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        requester: Requester,
        image_id: &ImageId,
        request: LegalRequest,
    ) -> Result<LegalOutcome, LegalError> {
        validate_legal(&request)?;

        let raw = match self.load(image_id).await? {
            ImageRecord::Raw(raw) => raw,
            ImageRecord::Final(image) => {
                let Some(raw_id) = image.original().raw_id() else {
                    return Err(LegalError::InvalidRequest(format!(
                        "image {} has a generated background",
                        image_id
                    )));
                };
                match self.load(&raw_id).await? {
                    ImageRecord::Raw(raw) => raw,
                    ImageRecord::Final(_) => {
                        return Err(LegalError::NotFound(raw_id.to_string()));
                    }
                }
            }
        };

        if !raw.may_edit_legal(requester.id) {
            return Ok(LegalOutcome::KeptExisting);
        }

        let legal: LegalInfo = request.into();
        self.repository.update_legal(&raw.id(), &legal).await?;
        info!(raw_id = %raw.id(), "legal info updated");
        Ok(LegalOutcome::Updated)
    }

    async fn load(&self, id: &ImageId) -> Result<ImageRecord, LegalError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| LegalError::NotFound(id.to_string()))
    }
}

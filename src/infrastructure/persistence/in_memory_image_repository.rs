use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::application::ports::{ImageRecord, ImageRepository, RepositoryError};
use crate::domain::entities::{FinalImage, LegalInfo, RawImage};
use crate::domain::value_objects::{ContentHash, ImageId};

/// Record store kept in process memory.
///
/// Used by `--in-memory` runs and the integration tests. Ordering by id
/// matches the Postgres keyset paging.
#[derive(Default)]
pub struct InMemoryImageRepository {
    records: RwLock<BTreeMap<Uuid, ImageRecord>>,
}

impl InMemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn raw_images(&self) -> Vec<RawImage> {
        self.records
            .read()
            .values()
            .filter_map(|r| match r {
                ImageRecord::Raw(raw) => Some(raw.clone()),
                ImageRecord::Final(_) => None,
            })
            .collect()
    }

    pub fn final_images(&self) -> Vec<FinalImage> {
        self.records
            .read()
            .values()
            .filter_map(|r| match r {
                ImageRecord::Final(image) => Some(image.clone()),
                ImageRecord::Raw(_) => None,
            })
            .collect()
    }

    fn insert(&self, record: ImageRecord) -> Result<ImageId, RepositoryError> {
        let id = record.id();
        let mut records = self.records.write();
        if records.contains_key(id.as_uuid()) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "duplicate image id {}",
                id
            )));
        }
        records.insert(*id.as_uuid(), record);
        Ok(id)
    }

    fn with_raw<F>(&self, id: &ImageId, f: F) -> Result<(), RepositoryError>
    where
        F: FnOnce(&mut RawImage),
    {
        match self.records.write().get_mut(id.as_uuid()) {
            Some(ImageRecord::Raw(raw)) => {
                f(raw);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn get(&self, id: &ImageId) -> Result<Option<ImageRecord>, RepositoryError> {
        Ok(self.records.read().get(id.as_uuid()).cloned())
    }

    async fn insert_raw_image(&self, image: &RawImage) -> Result<ImageId, RepositoryError> {
        self.insert(ImageRecord::Raw(image.clone()))
    }

    async fn insert_final_image(&self, image: &FinalImage) -> Result<ImageId, RepositoryError> {
        self.insert(ImageRecord::Final(image.clone()))
    }

    async fn find_by_digest(
        &self,
        digest: &ContentHash,
    ) -> Result<Option<RawImage>, RepositoryError> {
        Ok(self
            .raw_images()
            .into_iter()
            .filter(|raw| raw.digest() == digest)
            .min_by_key(|raw| (raw.created_at(), *raw.id().as_uuid())))
    }

    async fn delete(&self, id: &ImageId) -> Result<(), RepositoryError> {
        self.records.write().remove(id.as_uuid());
        Ok(())
    }

    async fn list_page(
        &self,
        after: Option<ImageId>,
        limit: i64,
    ) -> Result<Vec<ImageRecord>, RepositoryError> {
        let records = self.records.read();
        let take = limit.max(0) as usize;
        let page = match after {
            Some(id) => records
                .range((
                    std::ops::Bound::Excluded(*id.as_uuid()),
                    std::ops::Bound::Unbounded,
                ))
                .take(take)
                .map(|(_, r)| r.clone())
                .collect(),
            None => records.values().take(take).cloned().collect(),
        };
        Ok(page)
    }

    async fn append_bar_texts(
        &self,
        id: &ImageId,
        texts: &[String],
    ) -> Result<(), RepositoryError> {
        self.with_raw(id, |raw| raw.append_bar_texts(texts))
    }

    async fn update_legal(&self, id: &ImageId, legal: &LegalInfo) -> Result<(), RepositoryError> {
        self.with_raw(id, |raw| raw.set_legal(legal.clone()))
    }
}

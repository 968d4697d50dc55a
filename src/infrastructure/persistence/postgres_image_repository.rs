use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::QueryBuilder;
use crate::application::ports::{ImageRecord, ImageRepository, RepositoryError};
use crate::domain::entities::{CompositionMeta, FinalImage, LegalInfo, RawImage};
use crate::domain::value_objects::{ContentHash, ImageId, OriginalRef, RequesterId};

pub struct PostgresImageRepository {
    pool: PgPool,
}

impl PostgresImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PostgresImageRepository {
    async fn get(&self, id: &ImageId) -> Result<Option<ImageRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(&QueryBuilder::by_id())
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ImageRow::into_domain).transpose()
    }

    async fn insert_raw_image(&self, image: &RawImage) -> Result<ImageId, RepositoryError> {
        let legal = image.legal();

        sqlx::query(
            r#"
            INSERT INTO images (
                id, kind, file_name, owner_id, created_at,
                digest, width, height, bar_texts, photographer, license
            )
            VALUES ($1, 'raw', $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(image.id().as_uuid())
        .bind(image.file_name())
        .bind(image.owner().as_uuid())
        .bind(image.created_at())
        .bind(image.digest().as_hex())
        .bind(image.width() as i32)
        .bind(image.height() as i32)
        .bind(Json(image.bar_texts()))
        .bind(legal.map(|l| l.photographer.as_str()))
        .bind(legal.and_then(|l| l.license.as_deref()))
        .execute(&self.pool)
        .await?;

        Ok(image.id())
    }

    async fn insert_final_image(&self, image: &FinalImage) -> Result<ImageId, RepositoryError> {
        let meta = serde_json::to_value(image.meta())
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO images (
                id, kind, file_name, owner_id, created_at,
                thumb_file_name, original, meta
            )
            VALUES ($1, 'final', $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(image.id().as_uuid())
        .bind(image.file_name())
        .bind(image.owner().as_uuid())
        .bind(image.created_at())
        .bind(image.thumb_file_name())
        .bind(image.original().to_column())
        .bind(meta)
        .execute(&self.pool)
        .await?;

        Ok(image.id())
    }

    async fn find_by_digest(
        &self,
        digest: &ContentHash,
    ) -> Result<Option<RawImage>, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(&QueryBuilder::raw_by_digest())
            .bind(digest.as_hex())
            .fetch_optional(&self.pool)
            .await?;

        match row.map(ImageRow::into_domain).transpose()? {
            Some(ImageRecord::Raw(raw)) => Ok(Some(raw)),
            Some(ImageRecord::Final(image)) => Err(RepositoryError::Internal(format!(
                "digest lookup returned final image {}",
                image.id()
            ))),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &ImageId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_page(
        &self,
        after: Option<ImageId>,
        limit: i64,
    ) -> Result<Vec<ImageRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ImageRow>(&QueryBuilder::page_after())
            .bind(after.map(|id| *id.as_uuid()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ImageRow::into_domain).collect()
    }

    async fn append_bar_texts(
        &self,
        id: &ImageId,
        texts: &[String],
    ) -> Result<(), RepositoryError> {
        let texts: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            return Ok(());
        }

        let result = sqlx::query(
            r#"
            UPDATE images
            SET bar_texts = bar_texts || $2
            WHERE id = $1 AND kind = 'raw'
            "#,
        )
        .bind(id.as_uuid())
        .bind(Json(texts))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_legal(&self, id: &ImageId, legal: &LegalInfo) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET photographer = $2, license = $3
            WHERE id = $1 AND kind = 'raw'
            "#,
        )
        .bind(id.as_uuid())
        .bind(&legal.photographer)
        .bind(legal.license.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    kind: String,
    file_name: String,
    owner_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    digest: Option<String>,
    width: Option<i32>,
    height: Option<i32>,
    bar_texts: Json<Vec<String>>,
    photographer: Option<String>,
    license: Option<String>,
    thumb_file_name: Option<String>,
    original: Option<String>,
    meta: Option<Json<CompositionMeta>>,
}

impl ImageRow {
    fn into_domain(self) -> Result<ImageRecord, RepositoryError> {
        let id = ImageId::from_uuid(self.id);
        let owner = RequesterId::new(self.owner_id);
        let missing = |column: &str| {
            RepositoryError::SerializationError(format!("{} has no {}", self.id, column))
        };

        match self.kind.as_str() {
            "raw" => {
                let digest = self.digest.clone().ok_or_else(|| missing("digest"))?;
                let digest = ContentHash::from_hex(digest)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
                let legal = self.photographer.clone().map(|photographer| LegalInfo {
                    photographer,
                    license: self.license.clone(),
                });
                Ok(ImageRecord::Raw(RawImage::reconstruct(
                    id,
                    self.file_name.clone(),
                    digest,
                    owner,
                    self.width.unwrap_or(0).max(0) as u32,
                    self.height.unwrap_or(0).max(0) as u32,
                    self.bar_texts.0.clone(),
                    legal,
                    self.created_at,
                )))
            }
            "final" => {
                let original = self.original.as_deref().ok_or_else(|| missing("original"))?;
                let original = OriginalRef::from_column(original)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
                let meta = self.meta.clone().ok_or_else(|| missing("meta"))?.0;
                let thumb = self
                    .thumb_file_name
                    .clone()
                    .unwrap_or_else(|| self.file_name.clone());
                Ok(ImageRecord::Final(FinalImage::reconstruct(
                    id,
                    self.file_name.clone(),
                    thumb,
                    original,
                    meta,
                    owner,
                    self.created_at,
                )))
            }
            other => Err(RepositoryError::SerializationError(format!(
                "unknown image kind {}",
                other
            ))),
        }
    }
}

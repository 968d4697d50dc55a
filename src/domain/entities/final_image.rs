use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ImageId, OriginalRef, RequesterId};

/// Options that were applied to produce a final image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionMeta {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    pub border: String,
    pub logo: Option<String>,
    pub bar_texts: Vec<String>,
    pub copyright: Option<String>,
}

/// A composited output image and its thumbnail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalImage {
    id: ImageId,
    file_name: String,
    thumb_file_name: String,
    original: OriginalRef,
    meta: CompositionMeta,
    owner: RequesterId,
    created_at: DateTime<Utc>,
}

impl FinalImage {
    pub fn new(
        file_name: String,
        thumb_file_name: String,
        original: OriginalRef,
        meta: CompositionMeta,
        owner: RequesterId,
    ) -> Self {
        Self {
            id: ImageId::new(),
            file_name,
            thumb_file_name,
            original,
            meta,
            owner,
            created_at: Utc::now(),
        }
    }

    /// Reconstruct from storage
    pub fn reconstruct(
        id: ImageId,
        file_name: String,
        thumb_file_name: String,
        original: OriginalRef,
        meta: CompositionMeta,
        owner: RequesterId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            file_name,
            thumb_file_name,
            original,
            meta,
            owner,
            created_at,
        }
    }

    pub fn may_delete(&self, requester: RequesterId, is_super_admin: bool) -> bool {
        is_super_admin || self.owner == requester
    }

    // Getters
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn thumb_file_name(&self) -> &str {
        &self.thumb_file_name
    }

    pub fn original(&self) -> OriginalRef {
        self.original
    }

    pub fn meta(&self) -> &CompositionMeta {
        &self.meta
    }

    pub fn owner(&self) -> RequesterId {
        self.owner
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

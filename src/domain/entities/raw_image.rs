use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ContentHash, ImageId, RequesterId};

/// Rights information attached to an uploaded background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalInfo {
    pub photographer: String,
    pub license: Option<String>,
}

/// An unmodified uploaded background, stored once per distinct digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawImage {
    id: ImageId,
    file_name: String,
    digest: ContentHash,
    owner: RequesterId,
    width: u32,
    height: u32,
    bar_texts: Vec<String>,
    legal: Option<LegalInfo>,
    created_at: DateTime<Utc>,
}

impl RawImage {
    pub fn new(
        file_name: String,
        digest: ContentHash,
        owner: RequesterId,
        width: u32,
        height: u32,
        bar_texts: Vec<String>,
    ) -> Self {
        Self {
            id: ImageId::new(),
            file_name,
            digest,
            owner,
            width,
            height,
            bar_texts,
            legal: None,
            created_at: Utc::now(),
        }
    }

    /// Reconstruct from storage
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ImageId,
        file_name: String,
        digest: ContentHash,
        owner: RequesterId,
        width: u32,
        height: u32,
        bar_texts: Vec<String>,
        legal: Option<LegalInfo>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            file_name,
            digest,
            owner,
            width,
            height,
            bar_texts,
            legal,
            created_at,
        }
    }

    /// Remember texts from a later composition that reused this background
    pub fn append_bar_texts(&mut self, texts: &[String]) {
        self.bar_texts
            .extend(texts.iter().filter(|t| !t.trim().is_empty()).cloned());
    }

    /// Only the first uploader may set rights information
    pub fn may_edit_legal(&self, requester: RequesterId) -> bool {
        self.owner == requester
    }

    pub fn set_legal(&mut self, legal: LegalInfo) {
        self.legal = Some(legal);
    }

    // Getters
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn digest(&self) -> &ContentHash {
        &self.digest
    }

    pub fn owner(&self) -> RequesterId {
        self.owner
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bar_texts(&self) -> &[String] {
        &self.bar_texts
    }

    pub fn legal(&self) -> Option<&LegalInfo> {
        self.legal.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

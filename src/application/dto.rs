use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

use crate::application::composition::{BarSpec, BorderSpec, CopyrightSpec, LogoSpec};
use crate::domain::entities::LegalInfo;
use crate::domain::value_objects::{BackgroundKind, ContentHash, HexColor, RequesterId};

/// Who is asking, as established by the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: RequesterId,
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    pub from: HexColor,
    pub to: HexColor,
}

fn default_zoom() -> f64 {
    1.0
}

/// Background descriptor of a composition request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BackgroundSpec {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    /// Uploaded file name, for custom backgrounds
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default = "default_zoom")]
    #[validate(range(exclusive_min = 0.0))]
    pub zoom: f64,
    #[serde(default)]
    pub pos: Position,
    #[serde(default)]
    pub gradient: Option<GradientSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Size {
    #[validate(range(min = 1, max = 8000))]
    pub width: u32,
    #[validate(range(min = 1, max = 8000))]
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PreviewSpec {
    #[validate(nested)]
    pub size: Size,
}

/// User-submitted composition, as sent by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CompositionRequest {
    #[validate(nested)]
    pub image: BackgroundSpec,
    #[validate(nested)]
    pub preview: PreviewSpec,
    #[serde(default)]
    pub border: BorderSpec,
    #[serde(default)]
    pub copyright: Option<CopyrightSpec>,
    #[serde(default)]
    pub logo: Option<LogoSpec>,
    #[serde(default)]
    #[validate(length(max = 8))]
    pub bars: Vec<BarSpec>,
}

impl CompositionRequest {
    pub fn bar_texts(&self) -> Vec<String> {
        self.bars.iter().map(|b| b.text.clone()).collect()
    }
}

/// `rawImageHash` is the hex digest, or `false` without a custom background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawImageHash {
    Digest(ContentHash),
    None,
}

impl Serialize for RawImageHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawImageHash::Digest(hash) => serializer.serialize_str(hash.as_hex()),
            RawImageHash::None => serializer.serialize_bool(false),
        }
    }
}

/// Success payload of a composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeResponse {
    pub success: bool,
    pub filename: String,
    pub raw_image_hash: RawImageHash,
}

/// Response of the delete use case, mirroring the editor's contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LegalRequest {
    #[validate(length(min = 1, max = 200))]
    pub photographer: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub license: Option<String>,
}

impl From<LegalRequest> for LegalInfo {
    fn from(request: LegalRequest) -> Self {
        LegalInfo {
            photographer: request.photographer.trim().to_string(),
            license: request
                .license
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalOutcome {
    Updated,
    /// Someone else uploaded the background first; their info stays
    KeptExisting,
}

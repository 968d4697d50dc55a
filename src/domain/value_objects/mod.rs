mod background_kind;
mod color;
mod content_hash;
mod image_id;
mod original_ref;
mod requester_id;
mod storage_namespace;
mod upload_session_key;

pub use background_kind::BackgroundKind;
pub use color::HexColor;
pub use content_hash::ContentHash;
pub use image_id::ImageId;
pub use original_ref::OriginalRef;
pub use requester_id::RequesterId;
pub use storage_namespace::StorageNamespace;
pub use upload_session_key::UploadSessionKey;

mod final_image;
mod raw_image;
mod upload_session;

pub use final_image::{CompositionMeta, FinalImage};
pub use raw_image::{LegalInfo, RawImage};
pub use upload_session::{ChunkRejection, UploadSession};

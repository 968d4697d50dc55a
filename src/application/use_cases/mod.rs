mod add_legal;
mod compose_image;
mod delete_image;
mod submit_chunk;

pub use add_legal::{AddLegalUseCase, LegalError};
pub use compose_image::{ComposeImageUseCase, DEFAULT_MAX_CANVAS_EDGE};
pub use delete_image::{DeleteError, DeleteImageUseCase};
pub use submit_chunk::{SubmitChunkUseCase, UploadError};

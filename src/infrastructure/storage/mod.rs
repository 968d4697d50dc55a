mod chunk_assembler;
mod content_hasher;
mod local_image_store;
mod path_builder;

pub use chunk_assembler::{AssemblerSettings, LocalChunkAssembler, ALLOWED_EXTENSIONS};
pub use content_hasher::ContentHasher;
pub use local_image_store::LocalImageStore;
pub use path_builder::PathBuilder;

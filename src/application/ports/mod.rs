mod asset_source;
mod image_repository;
mod image_store;
mod upload_assembler;

pub use asset_source::{AssetError, AssetSource};
pub use image_repository::{ImageRecord, ImageRepository, RepositoryError};
pub use image_store::{ImageStore, Promotion, StorageError};
pub use upload_assembler::{
    AssemblyStatus, ChunkSubmission, CompletedUpload, TakeUploadError, UploadAssembler,
};

#[cfg(test)]
pub use asset_source::MockAssetSource;
#[cfg(test)]
pub use image_repository::MockImageRepository;
#[cfg(test)]
pub use image_store::MockImageStore;
#[cfg(test)]
pub use upload_assembler::MockUploadAssembler;

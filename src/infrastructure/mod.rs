pub mod assets;
pub mod persistence;
pub mod storage;

pub mod compose;
pub mod health;
pub mod images;
pub mod uploads;

pub use compose::compose_handler;
pub use health::{health_handler, readiness_handler};
pub use images::{delete_handler, legal_handler};
pub use uploads::upload_chunk_handler;

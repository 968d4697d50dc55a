mod in_memory_image_repository;
mod postgres_image_repository;
mod query_builder;

pub use in_memory_image_repository::InMemoryImageRepository;
pub use postgres_image_repository::PostgresImageRepository;
pub use query_builder::QueryBuilder;

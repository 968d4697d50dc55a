//! # Image Composer - Promotional Image Composition
//!
//! Turns an uploaded photo (or a generated gradient or transparent canvas)
//! into a branded promotional image: cropped and scaled to the requested
//! preview size, framed, stamped with copyright, logo and text bars, and
//! saved with a thumbnail.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Core business logic (entities, value objects, domain errors)
//! - **Application**: Use cases, ports and the composition engine
//! - **Infrastructure**: Adapters for storage, uploads, assets and persistence
//! - **API**: HTTP handlers and middleware
//!
//! ## Key Features
//!
//! - Chunked background uploads with bounded out-of-order reassembly
//! - Content-addressed raw images with duplicate reuse
//! - A fixed, observable stage pipeline that cleans up after itself on failure
//! - Background garbage collection of orphaned records and stale uploads
//!
//! ## Example Usage
//!
//! ```no_run
//! use image_composer::{ApplicationBuilder, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let builder = ApplicationBuilder::new(Config::from_env())
//!     .with_in_memory_repository()
//!     .with_infrastructure()
//!     .await?;
//! let app = image_composer::api::create_router(builder.build()?);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use api::errors as api_errors;
pub use application::builder::ApplicationBuilder;
pub use application::{composition, dto, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};

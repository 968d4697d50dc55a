use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::handlers::{
    compose_handler, delete_handler, health_handler, legal_handler, readiness_handler,
    upload_chunk_handler,
};
use crate::api::middleware::{cors, request_log, requester};
use crate::application::use_cases::{
    AddLegalUseCase, ComposeImageUseCase, DeleteImageUseCase, SubmitChunkUseCase,
};

/// Slack on top of the chunk size for the upload route body limit
const CHUNK_BODY_SLACK: usize = 64 * 1024;

/// Application state container
#[derive(Clone)]
pub struct AppState {
    /// `None` when running against the in-memory repository
    pub pool: Option<Arc<PgPool>>,
    pub compose_use_case: Arc<ComposeImageUseCase>,
    pub submit_chunk_use_case: Arc<SubmitChunkUseCase>,
    pub delete_use_case: Arc<DeleteImageUseCase>,
    pub legal_use_case: Arc<AddLegalUseCase>,
    pub chunk_size: usize,
    pub allowed_origins: Vec<String>,
}

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no identity required)
        .route("/health", get(health_handler))
        .route(
            "/health/ready",
            get(readiness_handler).with_state(state.pool.clone()),
        )
        .route(
            "/v1/images",
            post(compose_handler).with_state(Arc::clone(&state.compose_use_case)),
        )
        .route(
            "/v1/images/{id}",
            delete(delete_handler).with_state(Arc::clone(&state.delete_use_case)),
        )
        .route(
            "/v1/images/{id}/legal",
            post(legal_handler).with_state(Arc::clone(&state.legal_use_case)),
        )
        .route(
            "/v1/uploads/{file_name}/chunks/{index}",
            post(upload_chunk_handler)
                .with_state(Arc::clone(&state.submit_chunk_use_case))
                .layer(DefaultBodyLimit::max(state.chunk_size + CHUNK_BODY_SLACK)),
        )
        .layer(axum_middleware::from_fn(requester::requester_middleware))
        .layer(axum_middleware::from_fn(request_log::request_log_middleware))
        .layer(cors::create_cors_layer(&state.allowed_origins))
}

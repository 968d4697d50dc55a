use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Extension,
};
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::application::dto::{ComposeResponse, CompositionRequest, Requester};
use crate::application::use_cases::ComposeImageUseCase;

/// POST /v1/images
/// Compose a promotional image; failures come back as a JSON string
pub async fn compose_handler(
    State(use_case): State<Arc<ComposeImageUseCase>>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<CompositionRequest>, JsonRejection>,
) -> Result<Json<ComposeResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()).bare())?;

    let response = use_case.execute(requester, request).await?;
    Ok(Json(response))
}

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::application::dto::{DeleteResponse, LegalRequest, Requester};
use crate::application::use_cases::{AddLegalUseCase, DeleteImageUseCase};
use crate::domain::value_objects::ImageId;

fn parse_image_id(id: &str) -> Result<ImageId, ApiError> {
    id.parse::<ImageId>()
        .map_err(|e| ApiError::bad_request(format!("Invalid image ID: {}", e)))
}

/// DELETE /v1/images/{id}
pub async fn delete_handler(
    State(use_case): State<Arc<DeleteImageUseCase>>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let image_id = parse_image_id(&id)?;
    let response = use_case.execute(requester, &image_id).await?;
    Ok(Json(response))
}

/// POST /v1/images/{id}/legal
/// Attach photographer and license to the background behind `id`
pub async fn legal_handler(
    State(use_case): State<Arc<AddLegalUseCase>>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
    Json(request): Json<LegalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let image_id = parse_image_id(&id)?;
    let outcome = use_case.execute(requester, &image_id, request).await?;
    Ok(Json(json!({ "success": true, "outcome": outcome })))
}

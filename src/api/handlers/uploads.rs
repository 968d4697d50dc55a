use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::application::dto::Requester;
use crate::application::ports::AssemblyStatus;
use crate::application::use_cases::SubmitChunkUseCase;

#[derive(Debug, Deserialize)]
pub struct ChunkQuery {
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default, rename = "totalSize")]
    total_size: Option<u64>,
}

/// POST /v1/uploads/{file_name}/chunks/{index}
/// Body is the raw chunk
pub async fn upload_chunk_handler(
    State(use_case): State<Arc<SubmitChunkUseCase>>,
    Extension(requester): Extension<Requester>,
    Path((file_name, index)): Path<(String, u32)>,
    Query(query): Query<ChunkQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<AssemblyStatus>), ApiError> {
    let status = use_case
        .execute(
            requester.id,
            &file_name,
            index,
            body,
            query.is_final,
            query.total_size,
        )
        .await?;

    let code = match &status {
        AssemblyStatus::Incomplete => StatusCode::ACCEPTED,
        AssemblyStatus::Complete { .. } => StatusCode::OK,
        AssemblyStatus::Error { reason } if reason == "file_too_large" => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        AssemblyStatus::Error { .. } => StatusCode::BAD_REQUEST,
    };
    Ok((code, Json(status)))
}

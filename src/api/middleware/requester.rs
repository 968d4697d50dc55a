use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::errors::ApiError;
use crate::application::dto::Requester;
use crate::domain::value_objects::RequesterId;

pub const REQUESTER_ID_HEADER: &str = "x-requester-id";
pub const REQUESTER_ADMIN_HEADER: &str = "x-requester-admin";

/// Read the identity the fronting gateway attached to the request
pub fn requester_from_headers(headers: &HeaderMap) -> Result<Requester, ApiError> {
    let raw = headers
        .get(REQUESTER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing requester identity"))?;

    let id = RequesterId::from_string(raw.trim())
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let is_super_admin = headers
        .get(REQUESTER_ADMIN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false);

    Ok(Requester { id, is_super_admin })
}

/// Puts a [`Requester`] into the request extensions for every route
/// except the health probes
pub async fn requester_middleware(mut request: Request, next: Next) -> Response {
    if request.uri().path().starts_with("/health") {
        return next.run(request).await;
    }

    match requester_from_headers(request.headers()) {
        Ok(requester) => {
            request.extensions_mut().insert(requester);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

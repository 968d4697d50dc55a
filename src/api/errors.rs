use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::composition::StageErrorKind;
use crate::application::errors::ComposeError;
use crate::application::use_cases::{DeleteError, LegalError, UploadError};

/// API error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    bare: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            bare: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Send the message as a bare JSON string instead of `{"error": ...}`
    pub fn bare(mut self) -> Self {
        self.bare = true;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status.as_u16(),
                error = %self.message,
                "request failed"
            );
        }

        if self.bare {
            return (self.status, Json(self.message)).into_response();
        }

        let body = Json(json!({
            "error": self.message,
        }));

        (self.status, body).into_response()
    }
}

// Convert use case errors to API errors

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        let status = match &err {
            ComposeError::InvalidRequest(_) | ComposeError::InvalidImage(_) => {
                StatusCode::BAD_REQUEST
            }
            ComposeError::UploadIncomplete(_) => StatusCode::CONFLICT,
            ComposeError::Stage(stage) => match stage.kind {
                StageErrorKind::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StageErrorKind::AssetMissing(_) | StageErrorKind::Failed(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ComposeError::DuplicateResolution(_)
            | ComposeError::Repository(_)
            | ComposeError::Storage(_)
            | ComposeError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string()).bare()
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidRequest(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<DeleteError> for ApiError {
    fn from(err: DeleteError) -> Self {
        match err {
            DeleteError::NotFound(msg) => ApiError::not_found(msg),
            DeleteError::Forbidden(_) => ApiError::forbidden(err.to_string()),
            DeleteError::Repository(e) => {
                ApiError::internal_error(format!("Repository error: {}", e))
            }
            DeleteError::Storage(e) => ApiError::internal_error(format!("Storage error: {}", e)),
        }
    }
}

impl From<LegalError> for ApiError {
    fn from(err: LegalError) -> Self {
        match err {
            LegalError::NotFound(msg) => ApiError::not_found(msg),
            LegalError::InvalidRequest(msg) => ApiError::bad_request(msg),
            LegalError::Repository(e) => {
                ApiError::internal_error(format!("Repository error: {}", e))
            }
        }
    }
}

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::requester::{REQUESTER_ADMIN_HEADER, REQUESTER_ID_HEADER};

/// CORS for the editor front end; an empty origin list allows any origin
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect();

    let origins = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(REQUESTER_ID_HEADER),
            HeaderName::from_static(REQUESTER_ADMIN_HEADER),
        ])
        .allow_credentials(false)
        .max_age(std::time::Duration::from_secs(86400))
}

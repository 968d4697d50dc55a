use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

/// Hide connection details from probe responses
fn sanitize_db_error(error: &sqlx::Error) -> &'static str {
    match error {
        sqlx::Error::Configuration(_) => "Database configuration error",
        sqlx::Error::PoolTimedOut => "Database pool timed out",
        sqlx::Error::PoolClosed => "Database pool closed",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "Database connection error",
        _ => "Database query failed",
    }
}

/// GET /health
/// Basic health check endpoint (no database check)
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "image_composer",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// GET /health/ready
/// Readiness probe; checks the database when one is configured
pub async fn readiness_handler(
    State(pool): State<Option<Arc<PgPool>>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(pool) = pool else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": "image_composer",
                "database": "in_memory",
            })),
        );
    };

    let start_time = Instant::now();
    let db_check = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        sqlx::query("SELECT 1 as health_check").fetch_one(pool.as_ref()),
    )
    .await;
    let response_time = start_time.elapsed();

    match db_check {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": "image_composer",
                "database": "connected",
                "response_time_ms": response_time.as_millis(),
            })),
        ),
        Ok(Err(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "service": "image_composer",
                "database": "disconnected",
                "error": sanitize_db_error(&e),
                "response_time_ms": response_time.as_millis(),
            })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "service": "image_composer",
                "database": "timeout",
                "error": "Database query timed out after 2 seconds",
                "response_time_ms": response_time.as_millis(),
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        let (status, body) = health_handler().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.0["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let (status, body) = readiness_handler(State(None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.0["database"], "in_memory");
    }

    #[test]
    fn test_db_error_sanitization() {
        let config_error = sqlx::Error::Configuration("postgres://user:secret@db".into());
        assert_eq!(sanitize_db_error(&config_error), "Database configuration error");
        assert_eq!(sanitize_db_error(&sqlx::Error::PoolTimedOut), "Database pool timed out");
    }
}

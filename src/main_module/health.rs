//! Service info and liveness handlers

use axum::http::StatusCode;
use axum::Json;

use crate::core::urls::ApiUrls;

pub async fn root_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Task Management API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ApiUrls::endpoints()
    }))
}

/// Reports healthy whenever the process is serving requests.
pub async fn health_check_simple() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "taskserver",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

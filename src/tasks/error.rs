use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use diesel::r2d2::PoolError;
use tokio::task::JoinError;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TaskError {
    pub fn task_not_found() -> Self {
        Self::NotFound("Task not found".to_string())
    }
}

impl From<diesel::result::Error> for TaskError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<PoolError> for TaskError {
    fn from(e: PoolError) -> Self {
        Self::Storage(format!("DB connection error: {}", e))
    }
}

impl From<JoinError> for TaskError {
    fn from(e: JoinError) -> Self {
        Self::Storage(format!("Task join error: {}", e))
    }
}

impl From<JsonRejection> for TaskError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for TaskError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for TaskError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            Self::Validation(msg) => {
                log::warn!("Rejected task request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::NotFound(msg) => {
                log::warn!("{}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }
            Self::Storage(msg) => {
                log::error!("Task storage failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

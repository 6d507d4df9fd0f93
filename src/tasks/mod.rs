pub mod error;
pub mod repository;
pub mod types;
pub mod validation;

use crate::core::urls::ApiUrls;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use log::info;
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_session;

use error::TaskError;
use types::{
    BulkDeleteRequest, BulkDeleteResponse, BulkUpdateRequest, CreateTaskRequest, ListParams, Task,
    TaskJson, TaskPath, TaskQuery, TaskResponse, TaskUpdate,
};
use validation::{validate_create, validate_update};

fn into_responses(tasks: Vec<Task>) -> Vec<TaskResponse> {
    tasks.into_iter().map(TaskResponse::from).collect()
}

pub async fn handle_task_create(
    State(state): State<Arc<AppState>>,
    TaskJson(payload): TaskJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), TaskError> {
    let new_task = validate_create(payload, Utc::now())?;

    let task = with_session(&state.conn, move |conn| {
        repository::insert(conn, &new_task).map_err(TaskError::from)
    })
    .await?;

    info!("Created task {}", task.id);
    Ok((StatusCode::CREATED, Json(task.into())))
}

pub async fn handle_task_list(
    State(state): State<Arc<AppState>>,
    TaskQuery(params): TaskQuery<ListParams>,
) -> Result<Json<Vec<TaskResponse>>, TaskError> {
    let skip = i64::from(params.skip);
    let limit = i64::from(params.limit);

    let tasks = with_session(&state.conn, move |conn| {
        repository::list(conn, skip, limit).map_err(TaskError::from)
    })
    .await?;

    Ok(Json(into_responses(tasks)))
}

pub async fn handle_task_get(
    State(state): State<Arc<AppState>>,
    TaskPath(id): TaskPath<i32>,
) -> Result<Json<TaskResponse>, TaskError> {
    let task = with_session(&state.conn, move |conn| -> Result<_, TaskError> {
        repository::find(conn, id)?.ok_or_else(TaskError::task_not_found)
    })
    .await?;

    Ok(Json(task.into()))
}

pub async fn handle_task_update(
    State(state): State<Arc<AppState>>,
    TaskPath(id): TaskPath<i32>,
    TaskJson(payload): TaskJson<TaskUpdate>,
) -> Result<Json<TaskResponse>, TaskError> {
    let changes = validate_update(payload, Utc::now())?;

    let task = with_session(&state.conn, move |conn| -> Result<_, TaskError> {
        repository::update(conn, id, &changes)?.ok_or_else(TaskError::task_not_found)
    })
    .await?;

    info!("Updated task {}", task.id);
    Ok(Json(task.into()))
}

pub async fn handle_task_delete(
    State(state): State<Arc<AppState>>,
    TaskPath(id): TaskPath<i32>,
) -> Result<StatusCode, TaskError> {
    with_session(&state.conn, move |conn| -> Result<(), TaskError> {
        if repository::delete(conn, id)? {
            Ok(())
        } else {
            Err(TaskError::task_not_found())
        }
    })
    .await?;

    info!("Deleted task {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// The status is matched literally; values outside the enumeration simply
/// match nothing.
pub async fn handle_tasks_by_status(
    State(state): State<Arc<AppState>>,
    TaskPath(status): TaskPath<String>,
) -> Result<Json<Vec<TaskResponse>>, TaskError> {
    let tasks = with_session(&state.conn, move |conn| {
        repository::find_by_status(conn, &status).map_err(TaskError::from)
    })
    .await?;

    Ok(Json(into_responses(tasks)))
}

pub async fn handle_tasks_by_priority(
    State(state): State<Arc<AppState>>,
    TaskPath(priority): TaskPath<String>,
) -> Result<Json<Vec<TaskResponse>>, TaskError> {
    let tasks = with_session(&state.conn, move |conn| {
        repository::find_by_priority(conn, &priority).map_err(TaskError::from)
    })
    .await?;

    Ok(Json(into_responses(tasks)))
}

/// All payloads are validated before the first insert; one bad payload
/// rejects the whole batch.
pub async fn handle_tasks_bulk_create(
    State(state): State<Arc<AppState>>,
    TaskJson(payloads): TaskJson<Vec<CreateTaskRequest>>,
) -> Result<(StatusCode, Json<Vec<TaskResponse>>), TaskError> {
    let now = Utc::now();
    let new_tasks = payloads
        .into_iter()
        .map(|payload| validate_create(payload, now))
        .collect::<Result<Vec<_>, _>>()?;

    let tasks = with_session(&state.conn, move |conn| {
        repository::insert_many(conn, &new_tasks).map_err(TaskError::from)
    })
    .await?;

    info!("Bulk created {} tasks", tasks.len());
    Ok((StatusCode::CREATED, Json(into_responses(tasks))))
}

pub async fn handle_tasks_bulk_update(
    State(state): State<Arc<AppState>>,
    TaskJson(payload): TaskJson<BulkUpdateRequest>,
) -> Result<Json<Vec<TaskResponse>>, TaskError> {
    let changes = validate_update(payload.updates, Utc::now())?;
    let ids = payload.ids;

    let tasks = with_session(&state.conn, move |conn| {
        repository::update_many(conn, &ids, &changes).map_err(TaskError::from)
    })
    .await?;

    info!("Bulk updated {} tasks", tasks.len());
    Ok(Json(into_responses(tasks)))
}

pub async fn handle_tasks_bulk_delete(
    State(state): State<Arc<AppState>>,
    TaskJson(payload): TaskJson<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, TaskError> {
    let ids = payload.ids;

    let deleted = with_session(&state.conn, move |conn| -> Result<usize, TaskError> {
        match repository::delete_many(conn, &ids)? {
            0 => Err(TaskError::NotFound("No matching tasks found".to_string())),
            count => Ok(count),
        }
    })
    .await?;

    info!("Bulk deleted {} tasks", deleted);
    Ok(Json(BulkDeleteResponse {
        message: format!("Deleted {} tasks", deleted),
        deleted,
    }))
}

/// Configure task routes
pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::TASKS, post(handle_task_create).get(handle_task_list))
        .route(
            ApiUrls::TASK_BY_ID,
            get(handle_task_get)
                .put(handle_task_update)
                .delete(handle_task_delete),
        )
        .route(ApiUrls::TASKS_BY_STATUS, get(handle_tasks_by_status))
        .route(ApiUrls::TASKS_BY_PRIORITY, get(handle_tasks_by_priority))
        .route(ApiUrls::TASKS_BULK, post(handle_tasks_bulk_create))
        .route(ApiUrls::TASKS_BULK_UPDATE, put(handle_tasks_bulk_update))
        .route(ApiUrls::TASKS_BULK_DELETE, delete(handle_tasks_bulk_delete))
}

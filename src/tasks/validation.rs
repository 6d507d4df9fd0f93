//! Payload validation, applied before anything touches storage.
use chrono::{DateTime, Utc};

use crate::tasks::error::TaskError;
use crate::tasks::types::{CreateTaskRequest, NewTask, TaskChanges, TaskPriority, TaskStatus, TaskUpdate};

pub const TITLE_EMPTY: &str = "title cannot be empty";
pub const DUE_DATE_PAST: &str = "due date must be in the future";

/// Shared by the create and update validators. Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::Validation(TITLE_EMPTY.to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn validate_due_date(
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, TaskError> {
    match due_date {
        Some(due) if due <= now => Err(TaskError::Validation(DUE_DATE_PAST.to_string())),
        other => Ok(other),
    }
}

pub fn validate_status(status: Option<String>) -> Result<Option<String>, TaskError> {
    status
        .map(|s| s.parse::<TaskStatus>().map(|v| v.as_str().to_string()))
        .transpose()
}

pub fn validate_priority(priority: Option<String>) -> Result<Option<String>, TaskError> {
    priority
        .map(|p| p.parse::<TaskPriority>().map(|v| v.as_str().to_string()))
        .transpose()
}

pub fn validate_create(
    request: CreateTaskRequest,
    now: DateTime<Utc>,
) -> Result<NewTask, TaskError> {
    Ok(NewTask {
        title: validate_title(&request.title)?,
        description: request.description,
        status: validate_status(request.status)?,
        priority: validate_priority(request.priority)?,
        due_date: validate_due_date(request.due_date, now)?.map(|d| d.naive_utc()),
        assigned_to: request.assigned_to,
        created_at: now.naive_utc(),
    })
}

/// Due dates are not checked against `now` on update, so a task can be
/// moved into the past.
pub fn validate_update(update: TaskUpdate, now: DateTime<Utc>) -> Result<TaskChanges, TaskError> {
    Ok(TaskChanges {
        title: update.title.as_deref().map(validate_title).transpose()?,
        description: update.description,
        status: update.status.map(validate_status).transpose()?,
        priority: update.priority.map(validate_priority).transpose()?,
        due_date: update.due_date.map(|d| d.map(|d| d.naive_utc())),
        assigned_to: update.assigned_to,
        updated_at: Some(now.naive_utc()),
    })
}

//! Typed reads and writes against the `tasks` table.
//!
//! Every function takes the caller's connection so that a request's work
//! runs inside the session it opened (see `with_session`).
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::core::shared::schema::tasks;
use crate::tasks::types::{NewTask, Task, TaskChanges};

pub fn insert(conn: &mut SqliteConnection, new_task: &NewTask) -> QueryResult<Task> {
    diesel::insert_into(tasks::table)
        .values(new_task)
        .returning(Task::as_returning())
        .get_result(conn)
}

pub fn insert_many(conn: &mut SqliteConnection, new_tasks: &[NewTask]) -> QueryResult<Vec<Task>> {
    new_tasks.iter().map(|task| insert(conn, task)).collect()
}

pub fn list(conn: &mut SqliteConnection, skip: i64, limit: i64) -> QueryResult<Vec<Task>> {
    tasks::table
        .order(tasks::id.asc())
        .offset(skip)
        .limit(limit)
        .select(Task::as_select())
        .load(conn)
}

pub fn find(conn: &mut SqliteConnection, task_id: i32) -> QueryResult<Option<Task>> {
    tasks::table
        .find(task_id)
        .select(Task::as_select())
        .first(conn)
        .optional()
}

pub fn find_by_status(conn: &mut SqliteConnection, status: &str) -> QueryResult<Vec<Task>> {
    tasks::table
        .filter(tasks::status.eq(status))
        .order(tasks::id.asc())
        .select(Task::as_select())
        .load(conn)
}

pub fn find_by_priority(conn: &mut SqliteConnection, priority: &str) -> QueryResult<Vec<Task>> {
    tasks::table
        .filter(tasks::priority.eq(priority))
        .order(tasks::id.asc())
        .select(Task::as_select())
        .load(conn)
}

/// Returns `None` when no task has `task_id`.
pub fn update(
    conn: &mut SqliteConnection,
    task_id: i32,
    changes: &TaskChanges,
) -> QueryResult<Option<Task>> {
    diesel::update(tasks::table.find(task_id))
        .set(changes)
        .returning(Task::as_returning())
        .get_result(conn)
        .optional()
}

/// Applies the same changes to every task in `ids`; unknown ids are skipped.
pub fn update_many(
    conn: &mut SqliteConnection,
    ids: &[i32],
    changes: &TaskChanges,
) -> QueryResult<Vec<Task>> {
    let mut updated = diesel::update(tasks::table.filter(tasks::id.eq_any(ids)))
        .set(changes)
        .returning(Task::as_returning())
        .get_results(conn)?;
    updated.sort_by_key(|task| task.id);
    Ok(updated)
}

/// Returns whether a row was removed.
pub fn delete(conn: &mut SqliteConnection, task_id: i32) -> QueryResult<bool> {
    let removed = diesel::delete(tasks::table.find(task_id)).execute(conn)?;
    Ok(removed > 0)
}

pub fn delete_many(conn: &mut SqliteConnection, ids: &[i32]) -> QueryResult<usize> {
    diesel::delete(tasks::table.filter(tasks::id.eq_any(ids))).execute(conn)
}

diesel::table! {
    tasks (id) {
        id -> Integer,
        title -> Text,
        description -> Nullable<Text>,
        status -> Nullable<Text>,
        priority -> Nullable<Text>,
        due_date -> Nullable<Timestamp>,
        assigned_to -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Nullable<Timestamp>,
    }
}

pub use self::tasks::*;

/// DDL matching the `tasks` table definition above.
pub const CREATE_TASKS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT,
        priority TEXT,
        due_date TIMESTAMP,
        assigned_to TEXT,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status);
    CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks (priority);
";

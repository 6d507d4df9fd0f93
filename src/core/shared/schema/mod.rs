pub mod tasks;

pub use self::tasks::CREATE_TASKS_TABLE;

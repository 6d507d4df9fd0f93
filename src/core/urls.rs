#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Service info
    pub const ROOT: &'static str = "/";
    pub const HEALTH: &'static str = "/health";

    // Tasks - JSON APIs
    pub const TASKS: &'static str = "/tasks";
    pub const TASK_BY_ID: &'static str = "/tasks/{id}";
    pub const TASKS_BY_STATUS: &'static str = "/tasks/status/{status}";
    pub const TASKS_BY_PRIORITY: &'static str = "/tasks/priority/{priority}";

    // Tasks - bulk operations
    pub const TASKS_BULK: &'static str = "/tasks/bulk";
    pub const TASKS_BULK_UPDATE: &'static str = "/tasks/bulk/update";
    pub const TASKS_BULK_DELETE: &'static str = "/tasks/bulk/delete";

    pub fn endpoints() -> Vec<&'static str> {
        vec![
            Self::TASKS,
            Self::TASK_BY_ID,
            Self::TASKS_BY_STATUS,
            Self::TASKS_BY_PRIORITY,
            Self::TASKS_BULK,
            Self::TASKS_BULK_UPDATE,
            Self::TASKS_BULK_DELETE,
            Self::HEALTH,
        ]
    }
}

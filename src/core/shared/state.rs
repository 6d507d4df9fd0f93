use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        Self { conn, config }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool_state = self.conn.state();
        f.debug_struct("AppState")
            .field("connections", &pool_state.connections)
            .field("idle_connections", &pool_state.idle_connections)
            .field("config", &self.config)
            .finish()
    }
}

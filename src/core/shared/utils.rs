use crate::core::config::AppConfig;
use crate::core::shared::schema::CREATE_TASKS_TABLE;
use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use diesel::{Connection, SqliteConnection};
use log::info;
use std::time::Duration;
use tokio::task::JoinError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT_MS: u64 = 5_000;
const POOL_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-connection SQLite settings applied when the pool opens a connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub busy_timeout: Duration,
    pub enable_wal: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(BUSY_TIMEOUT_MS),
            enable_wal: true,
        }
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!("PRAGMA busy_timeout = {};", self.busy_timeout.as_millis());
        if self.enable_wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Turns a SQLAlchemy-style `sqlite:///path` URL into the path SQLite expects.
pub fn sqlite_path(database_url: &str) -> &str {
    let url = database_url.trim();
    url.strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .unwrap_or(url)
}

pub fn create_conn(config: &AppConfig) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(sqlite_path(&config.database_url));
    Pool::builder()
        .max_size(config.db_pool_size)
        .connection_timeout(POOL_CHECKOUT_TIMEOUT)
        .connection_customizer(Box::new(ConnectionOptions::default()))
        .build(manager)
}

/// Open the pool and create the schema if it does not exist yet.
///
/// Any failure here means the configured database is unreachable or not
/// writable, and the server must not start.
pub fn initialize(config: &AppConfig) -> Result<DbPool> {
    let path = sqlite_path(&config.database_url);
    let pool = create_conn(config)
        .with_context(|| format!("Failed to open database at {}", path))?;

    let mut conn = pool
        .get()
        .with_context(|| format!("Failed to connect to database at {}", path))?;
    conn.batch_execute(CREATE_TASKS_TABLE)
        .with_context(|| format!("Failed to create schema in {}", path))?;

    info!(
        "Database ready at {} (pool size {})",
        path, config.db_pool_size
    );
    Ok(pool)
}

/// Run `operation` against one pooled connection inside one transaction.
///
/// The work happens on a blocking thread. The transaction commits when
/// `operation` returns `Ok` and rolls back otherwise; the connection goes
/// back to the pool on every path.
pub async fn with_session<T, E, F>(pool: &DbPool, operation: F) -> Result<T, E>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<diesel::result::Error> + From<PoolError> + From<JoinError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<T, E> {
        let mut pooled = pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.transaction(operation)
    })
    .await
    .map_err(E::from)?
}

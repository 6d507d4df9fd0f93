use anyhow::Context;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use taskserver::core::config::AppConfig;
use taskserver::core::shared::state::AppState;
use taskserver::core::shared::utils::{initialize, sqlite_path};
use taskserver::main_module::run_axum_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        "Starting taskserver {} with database {}",
        env!("CARGO_PKG_VERSION"),
        sqlite_path(&config.database_url)
    );

    let pool = initialize(&config)?;
    let app_state = Arc::new(AppState::new(pool, config));

    run_axum_server(app_state).await?;
    info!("Server stopped");
    Ok(())
}

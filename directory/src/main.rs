// File: directory/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use directory::config::ConfigManager;
use directory::database::Database;
use directory::health::HttpProbe;
use directory::web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("directory=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Service Directory");

    let config_manager = ConfigManager::from_env().await?;
    let config = config_manager.get_current_config();

    // Startup also completes any retirement left half-done by a previous run
    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized at {}", config.database_path);

    let probe = Arc::new(HttpProbe::new(
        config.probe_timeout(),
        config.probe_path(),
    )?);
    let state = AppState::new(config.clone(), database, probe);

    match config.health_check_interval() {
        Some(period) => {
            let health_monitor = state.health_monitor.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                let mut sweep_count = 0u64;

                loop {
                    interval.tick().await;
                    sweep_count += 1;

                    match health_monitor.check_all_instances().await {
                        Ok(results) => {
                            if sweep_count.is_multiple_of(10) {
                                info!(
                                    "Health sweep #{} checked {} instances",
                                    sweep_count,
                                    results.len()
                                );
                            }
                        }
                        Err(e) => warn!("Health sweep #{} failed: {}", sweep_count, e),
                    }
                }
            });
            info!("Periodic health sweep every {}s", period.as_secs());
        }
        None => info!("Periodic health sweep disabled"),
    }

    start_web_server(state).await
}

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use class_scheduler::catalog::CatalogSnapshot;
use class_scheduler::config::ServerConfig;
use class_scheduler::server;
use class_scheduler::store::MemoryStore;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();
    let log_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let catalog = match &config.catalog_path {
        Some(path) => match CatalogSnapshot::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("Could not load catalog from {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            info!("No CATALOG_PATH set, starting with the demo catalog.");
            CatalogSnapshot::demo(Utc::now())
        }
    };
    let store = Arc::new(MemoryStore::from_catalog(catalog));

    if let Err(e) = server::run_server(config, store).await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

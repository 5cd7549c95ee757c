pub mod types;
pub mod config;
pub mod error;
pub mod registry;
pub mod flow;
pub mod board;
pub mod seeding;
pub mod results;
pub mod engine;
pub mod loader;
pub mod stats;
pub mod bracket_commands;
pub mod server;

use types::*;
use config::*;

use std::{fs, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() {
    load_env_file();

    // Initialize tracing with file output
    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "bracket.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Playoff bracket starting");

    let config = match load_config_inner() {
        Ok(config) => config,
        Err(e) => {
            error!("Config error, falling back to defaults: {e}");
            apply_env_defaults(AppConfig::default())
        }
    };
    log_env_warnings(&config);

    let bracket = match bracket_commands::bootstrap_bracket(&config) {
        Ok(bracket) => bracket,
        Err(e) => {
            error!("Bracket layout is invalid: {e}");
            return;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {e}");
            return;
        }
    };
    let addr = config.bind_addr.clone();
    let state = ServerState {
        bracket,
        config: Arc::new(config),
    };
    runtime.block_on(server::start_server(state, &addr));
}

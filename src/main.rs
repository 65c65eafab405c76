use std::process::ExitCode;

use tracing::{error, info, warn};

use mmiv::auth::AccountService;
use mmiv::web::{AppState, WebServer};
use mmiv::{Config, Database};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = mmiv::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        mmiv::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> mmiv::Result<()> {
    info!("mmiv bulletin board");

    let db = Database::open(&config.database.path).await?;

    let state = AppState::from_config(&config, db)?;

    if !config.admin.password.is_empty() {
        let accounts = AccountService::new(&state.db, &state.sessions);
        if let Some(admin) = accounts
            .bootstrap_admin(&config.admin.username, &config.admin.password)
            .await?
        {
            info!(username = %admin.username, "Created initial moderator account");
        }
    } else {
        warn!("No admin password configured; skipping moderator bootstrap");
    }

    let loaded = state.emoticons().reload(state.db.pool()).await?;
    info!(count = loaded, "Emoticons loaded");

    WebServer::new(&config, state)?.run().await
}

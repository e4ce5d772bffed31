use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sales_dm_assistant::{
    cli::{execute_command, Cli, Commands},
    config::{Config, LogFormat, StorageBackend},
    server::{AppState, McpServer},
    storage::{MemoryStorage, SqliteStorage, Storage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        "Sales DM assistant starting..."
    );

    let storage = init_storage(&config).await?;
    let state = Arc::new(AppState::new(config, storage));

    if state.config.demo.seed_data {
        match state.service.seed_demo_data().await {
            Ok(0) => {}
            Ok(n) => info!(clients = n, "Demo data loaded"),
            // a failed seed leaves the server usable
            Err(e) => warn!(error = %e, "Failed to seed demo data"),
        }
    }

    match cli.command() {
        Commands::Serve => {
            let server = McpServer::new(state);
            info!("Server ready, waiting for requests on stdin...");

            if let Err(e) = server.run().await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }

            info!("Server shutdown complete");
            Ok(())
        }
        command => {
            let result = execute_command(command, &state.service).await;
            if result.exit_code == 0 {
                println!("{}", result.message);
            } else {
                eprintln!("{}", result.message);
            }
            std::process::exit(result.exit_code);
        }
    }
}

/// Build the configured storage backend
async fn init_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageBackend::Sqlite => match SqliteStorage::new(&config.storage.database).await {
            Ok(s) => {
                info!(
                    path = %config.storage.database.path.display(),
                    "Database initialized"
                );
                Ok(Arc::new(s))
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize database");
                Err(e.into())
            }
        },
    }
}

/// Initialize tracing/logging. Output goes to stderr; stdout carries protocol frames.
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

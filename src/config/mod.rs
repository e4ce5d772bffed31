use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub demo: DemoConfig,
}

/// Which storage backend holds clients and interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps, gone on restart.
    Memory,
    /// SQLite via sqlx (in-memory unless `DATABASE_PATH` points at a file).
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: DatabaseConfig,
}

/// Database configuration for the SQLite backend
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Demo fixture configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub seed_data: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "sqlite" => StorageBackend::Sqlite,
            other => {
                return Err(AppError::Config {
                    message: format!(
                        "STORAGE_BACKEND must be 'memory' or 'sqlite', got '{}'",
                        other
                    ),
                })
            }
        };

        let storage = StorageConfig {
            backend,
            database: DatabaseConfig {
                path: PathBuf::from(
                    env::var("DATABASE_PATH").unwrap_or_else(|_| ":memory:".to_string()),
                ),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let demo = DemoConfig {
            seed_data: env::var("SEED_DEMO_DATA")
                .ok()
                .map(|s| parse_flag(&s))
                .unwrap_or(true),
        };

        Ok(Config {
            storage,
            logging,
            demo,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

impl DatabaseConfig {
    /// Whether this configuration targets a transient in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            demo: DemoConfig { seed_data: true },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
                max_connections: 5,
            },
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

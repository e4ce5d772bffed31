//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::service::SalesService;
use crate::storage::Storage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Sales conversation service over the configured storage.
    pub service: SalesService,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        tracing::info!(
            backend = ?config.storage.backend,
            seed_demo_data = config.demo.seed_data,
            "AppState initializing"
        );

        Self {
            config,
            service: SalesService::new(storage),
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

//! # Sales DM Assistant
//!
//! A Model Context Protocol (MCP) server that helps run Instagram sales
//! conversations: it classifies each inbound comment or DM by sender
//! personality, replies with a canned strategy-driven message, decides when
//! the purchase link goes out, scores conversion probability and watches
//! outreach volume against spam limits.
//!
//! ## Features
//!
//! - **Personality classification**: ordered keyword and length rules
//! - **Response generation**: one strategy per personality, link hand-off rules
//! - **Conversion scoring**: personality × funnel stage plus engagement bonuses
//! - **Risk assessment**: hourly and daily outreach limits
//! - **Analytics**: link, click and conversion rates with revenue
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → McpServer (stdio) → SalesService → engine (pure rules)
//!                                       ↓
//!                               Storage (memory | SQLite)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sales_dm_assistant::{AppState, Config, McpServer};
//! use sales_dm_assistant::storage::MemoryStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = Arc::new(AppState::new(config, Arc::new(MemoryStorage::new())));
//!     McpServer::new(state).run().await?;
//!     Ok(())
//! }
//! ```

/// Command-line interface and one-shot commands.
pub mod cli;
/// Configuration management.
pub mod config;
/// Personality rules, responses, scoring and risk checks.
pub mod engine;
/// Error types and result aliases for the application.
pub mod error;
/// MCP server implementation and request handling.
pub mod server;
/// Conversation pipeline, read models and demo data.
pub mod service;
/// Client and interaction persistence.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
pub use service::SalesService;

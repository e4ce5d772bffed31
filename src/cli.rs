//! Command-line interface.
//!
//! With no subcommand the binary serves MCP over stdio. The other
//! subcommands run the rule engine or read the configured store once and
//! print a human-readable report.

use clap::{Parser, Subcommand};

use crate::engine::{
    all_strategies, assess_risk, classify, score_for_stage_label, strategy_for, Personality,
    Strategy,
};
use crate::service::SalesService;

/// Instagram sales conversation assistant.
#[derive(Parser, Debug)]
#[command(name = "sales-dm-assistant", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Serve MCP requests over stdio (default)
    Serve,

    /// Classify a message into a personality category
    Classify {
        /// Message text
        message: String,

        /// Number of earlier messages from the same sender
        #[arg(long, default_value = "0")]
        prior: usize,
    },

    /// Compute a conversion probability
    Score {
        /// Personality: curious, hesitant, quick-tempered, skeptical, highly-engaged
        personality: Personality,

        /// Funnel stage label
        stage: String,

        /// Total interactions so far
        #[arg(long, default_value = "0")]
        interactions: u32,

        /// Link clicks so far
        #[arg(long, default_value = "0")]
        clicks: u32,
    },

    /// Check an outreach count against the spam limits
    AssessRisk {
        /// Replies sent within the window
        count: usize,

        /// Window length in hours (1 or 24)
        #[arg(long, default_value = "1")]
        window_hours: u32,
    },

    /// Show response strategies
    Strategies {
        /// Only show this personality's strategy
        #[arg(long)]
        personality: Option<Personality>,
    },

    /// List clients in the configured store
    Clients,

    /// Show dashboard analytics for the configured store
    Analytics,
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a one-shot CLI command. `Serve` is handled by the caller.
pub async fn execute_command(command: Commands, service: &SalesService) -> CliResult {
    match command {
        Commands::Serve => CliResult::error("serve is not a one-shot command"),
        Commands::Classify { message, prior } => execute_classify(&message, prior),
        Commands::Score {
            personality,
            stage,
            interactions,
            clicks,
        } => CliResult::success(format!(
            "{:.2}",
            score_for_stage_label(personality, &stage, interactions, clicks)
        )),
        Commands::AssessRisk {
            count,
            window_hours,
        } => {
            let assessment = assess_risk(count, window_hours);
            match assessment.message {
                Some(alert) => CliResult::error(alert),
                None => CliResult::success(format!(
                    "OK: {} in {}h window is within limits",
                    count, window_hours
                )),
            }
        }
        Commands::Strategies { personality } => {
            let strategies = match personality {
                Some(p) => vec![strategy_for(p)],
                None => all_strategies(),
            };
            CliResult::success(
                strategies
                    .into_iter()
                    .map(format_strategy)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
        Commands::Clients => execute_clients(service).await,
        Commands::Analytics => execute_analytics(service).await,
    }
}

fn execute_classify(message: &str, prior: usize) -> CliResult {
    let personality = classify(message, prior);
    let strategy = strategy_for(personality);
    CliResult::success(format!(
        "{}\n  tone:     {}\n  triggers: {}",
        personality,
        strategy.tone,
        strategy.triggers.join(", ")
    ))
}

fn format_strategy(strategy: &Strategy) -> String {
    let mut output = format!(
        "{}\n  tone:     {}\n  approach: {}\n  triggers: {}\n",
        strategy.personality,
        strategy.tone,
        strategy.approach,
        strategy.triggers.join(", ")
    );
    for example in strategy.examples {
        output.push_str(&format!("  - {}\n", example));
    }
    output
}

async fn execute_clients(service: &SalesService) -> CliResult {
    let clients = match service.list_clients().await {
        Ok(c) => c,
        Err(e) => return CliResult::error(format!("Failed to list clients: {}", e)),
    };

    if clients.is_empty() {
        return CliResult::success("No clients recorded");
    }

    let mut output = format!(
        "{:<24} {:<16} {:<14} {:>6} {:>6}\n",
        "USERNAME", "PERSONALITY", "STAGE", "MSGS", "PROB"
    );
    for client in clients {
        output.push_str(&format!(
            "{:<24} {:<16} {:<14} {:>6} {:>6.2}\n",
            client.username,
            client.personality.as_str(),
            client.stage.as_str(),
            client.total_interactions,
            client.conversion_probability
        ));
    }
    CliResult::success(output)
}

async fn execute_analytics(service: &SalesService) -> CliResult {
    match service.analytics().await {
        Ok(summary) => CliResult::success(format!(
            "Clients:              {}\n\
             Active (24h):         {}\n\
             Conversion rate:      {:.1}%\n\
             Link click rate:      {:.1}%\n\
             Interactions today:   {}\n\
             Revenue:              ${:.2}",
            summary.total_clients,
            summary.active_conversations,
            summary.conversion_rate,
            summary.link_click_rate,
            summary.daily_interactions,
            summary.revenue_generated
        )),
        Err(e) => CliResult::error(format!("Failed to compute analytics: {}", e)),
    }
}

//! Dashboard aggregates over the whole store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Client, Interaction};

/// Price of the course, used to turn conversions into revenue.
pub const UNIT_PRICE: f64 = 297.0;

/// Window in which a client still counts as an active conversation.
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Aggregate numbers for the operator dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_clients: usize,
    /// Clients who messaged within the last 24 hours.
    pub active_conversations: usize,
    /// Conversions per link sent, as a percentage.
    pub conversion_rate: f64,
    /// Link clicks per link sent, as a percentage.
    pub link_click_rate: f64,
    /// Interactions since midnight UTC.
    pub daily_interactions: usize,
    pub revenue_generated: f64,
}

/// Compute the dashboard aggregates as of `now`.
///
/// Both rates are zero when no link has gone out yet.
pub fn compute_analytics(
    clients: &[Client],
    interactions: &[Interaction],
    now: DateTime<Utc>,
) -> AnalyticsSummary {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now);
    let active_since = now - Duration::hours(ACTIVE_WINDOW_HOURS);

    let links_sent = interactions.iter().filter(|i| i.link_sent).count();
    let link_clicks = interactions.iter().filter(|i| i.link_clicked).count();
    let conversions = interactions.iter().filter(|i| i.converted).count();

    let percent_of_links = |n: usize| {
        if links_sent > 0 {
            n as f64 / links_sent as f64 * 100.0
        } else {
            0.0
        }
    };

    AnalyticsSummary {
        total_clients: clients.len(),
        active_conversations: clients
            .iter()
            .filter(|c| c.last_interaction >= active_since)
            .count(),
        conversion_rate: percent_of_links(conversions),
        link_click_rate: percent_of_links(link_clicks),
        daily_interactions: interactions
            .iter()
            .filter(|i| i.timestamp >= midnight)
            .count(),
        revenue_generated: conversions as f64 * UNIT_PRICE,
    }
}

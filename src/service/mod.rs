//! Sales conversation service.
//!
//! Glues the pure rule engine to the storage port:
//! - [`SalesService::analyze_message`]: one inbound message, end to end
//! - read models for clients, interactions and [`analytics`]
//! - external funnel stage updates
//! - [`demo`] fixture seeding

pub mod analytics;
pub mod demo;

pub use analytics::*;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{
    assess_risk, classify, generate, FunnelStage, GeneratedResponse, Personality, RiskAssessment,
};
use crate::error::{AppError, AppResult};
use crate::storage::{Client, Interaction, InteractionType, Storage};

/// Input for analyzing one inbound message.
///
/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeParams {
    /// Sender's Instagram username
    #[serde(default, alias = "client_username", alias = "clientUsername")]
    pub username: String,
    /// Message text
    #[serde(default)]
    pub message: String,
    /// Channel the message came in on (default: dm)
    #[serde(
        default,
        alias = "interactionType",
        skip_serializing_if = "Option::is_none"
    )]
    pub interaction_type: Option<InteractionType>,
}

/// Client fields returned alongside a generated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub id: String,
    pub username: String,
    pub personality: Personality,
    pub conversion_probability: f64,
}

/// Result of analyzing one inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub interaction_id: String,
    pub response: GeneratedResponse,
    pub client: ClientSnapshot,
    pub risk_assessment: RiskAssessment,
}

/// Input for moving a client along the funnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStageParams {
    pub client_id: String,
    pub stage: FunnelStage,
}

/// Service handler for sales conversations.
#[derive(Clone)]
pub struct SalesService {
    storage: Arc<dyn Storage>,
}

impl SalesService {
    /// Create a new service over the given storage backend
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Get a reference to the storage backend.
    #[inline]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Classify a message, generate a reply, record it and check outreach volume.
    ///
    /// All rule evaluation happens before the first write, so a failed
    /// computation never leaves a half-updated client behind.
    pub async fn analyze_message(&self, params: AnalyzeParams) -> AppResult<AnalyzeResult> {
        let start = Instant::now();

        if params.username.trim().is_empty() {
            return Err(AppError::validation("username", "Username is required"));
        }
        if params.message.trim().is_empty() {
            return Err(AppError::validation("message", "Message is required"));
        }

        let existing = self.storage.get_client_by_username(&params.username).await?;

        let history = match &existing {
            Some(client) => {
                let mut interactions = self.storage.get_client_interactions(&client.id).await?;
                interactions.sort_by_key(|i| i.timestamp);
                interactions.into_iter().map(|i| i.content).collect()
            }
            None => Vec::new(),
        };

        let personality = classify(&params.message, history.len());
        let stage = existing
            .as_ref()
            .map(|c| c.stage)
            .unwrap_or(FunnelStage::Awareness);
        let response = generate(&params.message, personality, &history, stage);

        debug!(
            username = %params.username,
            personality = %personality,
            history_len = history.len(),
            follow_up = ?response.follow_up_action,
            "Generated response"
        );

        let now = Utc::now();
        let is_new = existing.is_none();
        let mut client = existing.unwrap_or_else(|| Client::new(&params.username, personality));
        client.record_interaction(personality, now);

        let interaction = Interaction::new(
            &client.id,
            params.interaction_type.unwrap_or_default(),
            &params.message,
        )
        .with_response(&response.text)
        .with_timestamp(now)
        .with_link_sent(
            response
                .follow_up_action
                .map(|a| a.sends_link())
                .unwrap_or(false),
        );

        self.storage.record_exchange(&client, &interaction).await?;

        let recent = self
            .storage
            .count_interactions_since(now - Duration::hours(1))
            .await?;
        let risk_assessment = assess_risk(recent, 1);
        if let Some(alert) = &risk_assessment.message {
            warn!(recent_interactions = recent, "{}", alert);
        }

        info!(
            client_id = %client.id,
            personality = %personality,
            new_client = is_new,
            conversion_probability = client.conversion_probability,
            latency_ms = start.elapsed().as_millis() as u64,
            "Message analyzed"
        );

        Ok(AnalyzeResult {
            interaction_id: interaction.id,
            response,
            client: ClientSnapshot {
                id: client.id,
                username: client.username,
                personality,
                conversion_probability: client.conversion_probability,
            },
            risk_assessment,
        })
    }

    /// All clients, most recently active first.
    pub async fn list_clients(&self) -> AppResult<Vec<Client>> {
        let mut clients = self.storage.list_clients().await?;
        clients.sort_by(|a, b| b.last_interaction.cmp(&a.last_interaction));
        Ok(clients)
    }

    /// Interactions for one client, or for everyone, newest first.
    pub async fn list_interactions(&self, client_id: Option<&str>) -> AppResult<Vec<Interaction>> {
        let mut interactions = match client_id {
            Some(id) => self.storage.get_client_interactions(id).await?,
            None => self.storage.list_interactions().await?,
        };
        interactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(interactions)
    }

    /// Aggregate dashboard numbers over the whole store.
    pub async fn analytics(&self) -> AppResult<AnalyticsSummary> {
        let clients = self.storage.list_clients().await?;
        let interactions = self.storage.list_interactions().await?;
        Ok(compute_analytics(&clients, &interactions, Utc::now()))
    }

    /// Move a client to another funnel stage and rescore it.
    pub async fn set_stage(&self, params: SetStageParams) -> AppResult<Client> {
        let mut client = self
            .storage
            .get_client(&params.client_id)
            .await?
            .ok_or_else(|| AppError::ClientNotFound {
                client_id: params.client_id.clone(),
            })?;

        let previous = client.stage;
        client.set_stage(params.stage);
        self.storage.update_client(&client).await?;

        info!(
            client_id = %client.id,
            from = %previous,
            to = %client.stage,
            "Funnel stage updated"
        );

        Ok(client)
    }

    /// Load the demo fixture unless the store already holds clients.
    ///
    /// Returns the number of clients inserted.
    pub async fn seed_demo_data(&self) -> AppResult<usize> {
        if !self.storage.list_clients().await?.is_empty() {
            debug!("Store not empty, skipping demo seed");
            return Ok(0);
        }

        let fixture = demo::demo_fixture(Utc::now());
        for (client, interaction) in fixture.clients.iter().zip(&fixture.interactions) {
            self.storage.record_exchange(client, interaction).await?;
        }

        info!(
            clients = fixture.clients.len(),
            interactions = fixture.interactions.len(),
            "Demo data seeded"
        );
        Ok(fixture.clients.len())
    }
}

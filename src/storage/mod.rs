//! Storage layer for clients and their interactions.
//!
//! The [`Storage`] trait is the only way the service touches persistent
//! state. Two backends implement it:
//! - [`MemoryStorage`]: process-local maps, the default
//! - [`SqliteStorage`]: sqlx-backed SQLite, in-memory or file

mod memory;
mod sqlite;


pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{score, FunnelStage, Personality};
use crate::error::StorageResult;

/// A prospect identified by their Instagram username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier.
    pub id: String,
    /// Instagram handle; one client per username.
    pub username: String,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Personality from the most recent message.
    pub personality: Personality,
    /// Funnel position, set externally.
    pub stage: FunnelStage,
    /// Topics the client cares about, display only.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Number of inbound messages recorded.
    pub total_interactions: u32,
    /// Number of purchase links the client opened.
    pub link_clicks: u32,
    /// Share of outreach the client answered (0.0-1.0), display only.
    pub response_rate: f64,
    /// Derived conversion probability (0.0-0.95).
    pub conversion_probability: f64,
    /// When the client last messaged.
    pub last_interaction: DateTime<Utc>,
    /// When the client was first seen.
    pub created_at: DateTime<Utc>,
}

/// Channel an inbound message arrived on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum InteractionType {
    /// Public comment on a post.
    Comment,
    /// Direct message.
    #[default]
    Dm,
    /// Reply to a story.
    StoryReply,
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionType::Comment => write!(f, "comment"),
            InteractionType::Dm => write!(f, "dm"),
            InteractionType::StoryReply => write!(f, "story-reply"),
        }
    }
}

impl std::str::FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comment" => Ok(InteractionType::Comment),
            "dm" => Ok(InteractionType::Dm),
            "story-reply" => Ok(InteractionType::StoryReply),
            _ => Err(format!("Unknown interaction type: {}", s)),
        }
    }
}

impl TryFrom<String> for InteractionType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One inbound message and the reply generated for it. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Unique interaction identifier.
    pub id: String,
    /// Owning client ID.
    pub client_id: String,
    /// Channel the message came in on.
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    /// Raw inbound text.
    pub content: String,
    /// Generated reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
    /// Whether a purchase link went out with the reply.
    #[serde(default)]
    pub link_sent: bool,
    /// Whether the client opened the link.
    #[serde(default)]
    pub link_clicked: bool,
    /// Whether the client bought.
    #[serde(default)]
    pub converted: bool,
}

impl Client {
    /// Create a first-contact client at the top of the funnel.
    pub fn new(username: impl Into<String>, personality: Personality) -> Self {
        let now = Utc::now();
        let mut client = Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            name: None,
            personality,
            stage: FunnelStage::Awareness,
            interests: Vec::new(),
            total_interactions: 0,
            link_clicks: 0,
            response_rate: 1.0,
            conversion_probability: 0.0,
            last_interaction: now,
            created_at: now,
        };
        client.refresh_conversion_probability();
        client
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the funnel stage
    pub fn with_stage(mut self, stage: FunnelStage) -> Self {
        self.stage = stage;
        self.refresh_conversion_probability();
        self
    }

    /// Set the interests list
    pub fn with_interests(mut self, interests: Vec<String>) -> Self {
        self.interests = interests;
        self
    }

    /// Set interaction and click counters
    pub fn with_counters(mut self, total_interactions: u32, link_clicks: u32) -> Self {
        self.total_interactions = total_interactions;
        self.link_clicks = link_clicks;
        self.refresh_conversion_probability();
        self
    }

    /// Set the response rate, clamped to 0.0-1.0
    pub fn with_response_rate(mut self, rate: f64) -> Self {
        self.response_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set both timestamps
    pub fn with_timestamps(
        mut self,
        created_at: DateTime<Utc>,
        last_interaction: DateTime<Utc>,
    ) -> Self {
        self.created_at = created_at;
        self.last_interaction = last_interaction;
        self
    }

    /// Count one more inbound message with its classified personality.
    pub fn record_interaction(&mut self, personality: Personality, at: DateTime<Utc>) {
        self.personality = personality;
        self.total_interactions = self.total_interactions.saturating_add(1);
        self.last_interaction = at;
        self.refresh_conversion_probability();
    }

    /// Move the client to another funnel stage.
    pub fn set_stage(&mut self, stage: FunnelStage) {
        self.stage = stage;
        self.refresh_conversion_probability();
    }

    /// Recompute `conversion_probability` from the current fields.
    pub fn refresh_conversion_probability(&mut self) {
        self.conversion_probability = score(
            self.personality,
            self.stage,
            self.total_interactions,
            self.link_clicks,
        );
    }
}

impl Interaction {
    /// Create an interaction received now
    pub fn new(
        client_id: impl Into<String>,
        interaction_type: InteractionType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            interaction_type,
            content: content.into(),
            response: None,
            timestamp: Utc::now(),
            link_sent: false,
            link_clicked: false,
            converted: false,
        }
    }

    /// Set the generated reply
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Set the receive time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Mark whether a link went out with the reply
    pub fn with_link_sent(mut self, sent: bool) -> Self {
        self.link_sent = sent;
        self
    }

    /// Mark whether the link was opened
    pub fn with_link_clicked(mut self, clicked: bool) -> Self {
        self.link_clicked = clicked;
        self
    }

    /// Mark whether the client bought
    pub fn with_converted(mut self, converted: bool) -> Self {
        self.converted = converted;
        self
    }
}

/// Storage trait for client and interaction persistence.
///
/// Interactions are append-only. Backends keep insertion order per client
/// and make no promise about ordering across clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    // Client operations

    /// Insert a new client. Fails if the username is taken.
    async fn create_client(&self, client: &Client) -> StorageResult<()>;
    /// Get a client by ID.
    async fn get_client(&self, id: &str) -> StorageResult<Option<Client>>;
    /// Get a client by username.
    async fn get_client_by_username(&self, username: &str) -> StorageResult<Option<Client>>;
    /// Replace a stored client. Fails if the ID is unknown.
    async fn update_client(&self, client: &Client) -> StorageResult<()>;
    /// List every client, unordered.
    async fn list_clients(&self) -> StorageResult<Vec<Client>>;

    // Interaction operations

    /// Append an interaction to its client's list. Fails if the client is unknown.
    async fn append_interaction(&self, interaction: &Interaction) -> StorageResult<()>;
    /// Insert or replace `client` and append `interaction` as one unit.
    ///
    /// On error neither write is visible.
    async fn record_exchange(&self, client: &Client, interaction: &Interaction)
        -> StorageResult<()>;
    /// Get a client's interactions in insertion order.
    async fn get_client_interactions(&self, client_id: &str) -> StorageResult<Vec<Interaction>>;
    /// List every interaction across clients.
    async fn list_interactions(&self) -> StorageResult<Vec<Interaction>>;
    /// Count interactions with a timestamp strictly after `since`.
    async fn count_interactions_since(&self, since: DateTime<Utc>) -> StorageResult<usize>;
}

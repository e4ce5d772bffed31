use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Executor;
use std::str::FromStr;
use tracing::info;

use super::{Client, Interaction, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if config.is_in_memory() {
            return Self::new_in_memory().await;
        }

        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                    message: format!("Failed to create database directory: {}", e),
                })?;
            }
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create a transient in-memory database.
    ///
    /// Every connection to `sqlite::memory:` opens its own database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Fixed-width UTC timestamps so text comparison in SQL matches time order.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query {
            message: format!("Invalid timestamp '{}': {}", value, e),
        })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

const CLIENT_COLUMNS: &str = "id, username, name, personality, stage, interests, total_interactions, link_clicks, response_rate, conversion_probability, last_interaction, created_at";

const INTERACTION_COLUMNS: &str =
    "id, client_id, interaction_type, content, response, timestamp, link_sent, link_clicked, converted";

fn encode_interests(interests: &[String]) -> StorageResult<String> {
    serde_json::to_string(interests).map_err(|e| StorageError::Query {
        message: format!("Failed to encode interests: {}", e),
    })
}

fn decode_counter(column: &str, value: i64) -> StorageResult<u32> {
    u32::try_from(value).map_err(|_| StorageError::Query {
        message: format!("Invalid {} value: {}", column, value),
    })
}

async fn insert_client<'e, E>(executor: E, client: &Client) -> StorageResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let interests = encode_interests(&client.interests)?;

    let result = sqlx::query(
        r#"
        INSERT INTO clients (id, username, name, personality, stage, interests, total_interactions, link_clicks, response_rate, conversion_probability, last_interaction, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&client.id)
    .bind(&client.username)
    .bind(&client.name)
    .bind(client.personality.as_str())
    .bind(client.stage.as_str())
    .bind(&interests)
    .bind(i64::from(client.total_interactions))
    .bind(i64::from(client.link_clicks))
    .bind(client.response_rate)
    .bind(client.conversion_probability)
    .bind(encode_timestamp(&client.last_interaction))
    .bind(encode_timestamp(&client.created_at))
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(StorageError::DuplicateUsername {
            username: client.username.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Returns `ClientNotFound` when no row has the client's ID.
async fn replace_client<'e, E>(executor: E, client: &Client) -> StorageResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let interests = encode_interests(&client.interests)?;

    let result = sqlx::query(
        r#"
        UPDATE clients
        SET username = ?, name = ?, personality = ?, stage = ?, interests = ?,
            total_interactions = ?, link_clicks = ?, response_rate = ?,
            conversion_probability = ?, last_interaction = ?
        WHERE id = ?
        "#,
    )
    .bind(&client.username)
    .bind(&client.name)
    .bind(client.personality.as_str())
    .bind(client.stage.as_str())
    .bind(&interests)
    .bind(i64::from(client.total_interactions))
    .bind(i64::from(client.link_clicks))
    .bind(client.response_rate)
    .bind(client.conversion_probability)
    .bind(encode_timestamp(&client.last_interaction))
    .bind(&client.id)
    .execute(executor)
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) if is_unique_violation(&e) => {
            return Err(StorageError::DuplicateUsername {
                username: client.username.clone(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    if result.rows_affected() == 0 {
        return Err(StorageError::ClientNotFound {
            client_id: client.id.clone(),
        });
    }

    Ok(())
}

async fn insert_interaction<'e, E>(executor: E, interaction: &Interaction) -> StorageResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO interactions (id, client_id, interaction_type, content, response, timestamp, link_sent, link_clicked, converted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&interaction.id)
    .bind(&interaction.client_id)
    .bind(interaction.interaction_type.to_string())
    .bind(&interaction.content)
    .bind(&interaction.response)
    .bind(encode_timestamp(&interaction.timestamp))
    .bind(interaction.link_sent)
    .bind(interaction.link_clicked)
    .bind(interaction.converted)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_foreign_key_violation(&e) => Err(StorageError::ClientNotFound {
            client_id: interaction.client_id.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_client(&self, client: &Client) -> StorageResult<()> {
        insert_client(&self.pool, client).await
    }

    async fn get_client(&self, id: &str) -> StorageResult<Option<Client>> {
        let row: Option<ClientRow> =
            sqlx::query_as(&format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Client::try_from).transpose()
    }

    async fn get_client_by_username(&self, username: &str) -> StorageResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {} FROM clients WHERE username = ?",
            CLIENT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Client::try_from).transpose()
    }

    async fn update_client(&self, client: &Client) -> StorageResult<()> {
        replace_client(&self.pool, client).await
    }

    async fn list_clients(&self) -> StorageResult<Vec<Client>> {
        let rows: Vec<ClientRow> =
            sqlx::query_as(&format!("SELECT {} FROM clients ORDER BY rowid", CLIENT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Client::try_from).collect()
    }

    async fn append_interaction(&self, interaction: &Interaction) -> StorageResult<()> {
        insert_interaction(&self.pool, interaction).await
    }

    async fn record_exchange(
        &self,
        client: &Client,
        interaction: &Interaction,
    ) -> StorageResult<()> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        match replace_client(&mut *tx, client).await {
            Ok(()) => {}
            Err(StorageError::ClientNotFound { .. }) => insert_client(&mut *tx, client).await?,
            Err(e) => return Err(e),
        }
        insert_interaction(&mut *tx, interaction).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_client_interactions(&self, client_id: &str) -> StorageResult<Vec<Interaction>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM interactions WHERE client_id = ? ORDER BY rowid",
            INTERACTION_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Interaction::try_from).collect()
    }

    async fn list_interactions(&self) -> StorageResult<Vec<Interaction>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM interactions ORDER BY rowid",
            INTERACTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Interaction::try_from).collect()
    }

    async fn count_interactions_since(&self, since: DateTime<Utc>) -> StorageResult<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM interactions WHERE timestamp > ?")
                .bind(encode_timestamp(&since))
                .fetch_one(&self.pool)
                .await?;

        usize::try_from(count).map_err(|_| StorageError::Query {
            message: format!("Invalid interaction count: {}", count),
        })
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    username: String,
    name: Option<String>,
    personality: String,
    stage: String,
    interests: String,
    total_interactions: i64,
    link_clicks: i64,
    response_rate: f64,
    conversion_probability: f64,
    last_interaction: String,
    created_at: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = StorageError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let invalid = |message: String| StorageError::Query { message };

        Ok(Self {
            personality: row.personality.parse().map_err(invalid)?,
            stage: row.stage.parse().map_err(invalid)?,
            interests: serde_json::from_str(&row.interests).map_err(|e| {
                invalid(format!("Invalid interests '{}': {}", row.interests, e))
            })?,
            total_interactions: decode_counter("total_interactions", row.total_interactions)?,
            link_clicks: decode_counter("link_clicks", row.link_clicks)?,
            response_rate: row.response_rate,
            conversion_probability: row.conversion_probability,
            last_interaction: decode_timestamp(&row.last_interaction)?,
            created_at: decode_timestamp(&row.created_at)?,
            id: row.id,
            username: row.username,
            name: row.name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    id: String,
    client_id: String,
    interaction_type: String,
    content: String,
    response: Option<String>,
    timestamp: String,
    link_sent: bool,
    link_clicked: bool,
    converted: bool,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = StorageError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            interaction_type: row
                .interaction_type
                .parse()
                .map_err(|message| StorageError::Query { message })?,
            timestamp: decode_timestamp(&row.timestamp)?,
            id: row.id,
            client_id: row.client_id,
            content: row.content,
            response: row.response,
            link_sent: row.link_sent,
            link_clicked: row.link_clicked,
            converted: row.converted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = DateTime::parse_from_rfc3339("2024-05-01T10:00:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-05-01T10:00:05.123Z")
            .unwrap()
            .with_timezone(&Utc);

        let (a, b) = (encode_timestamp(&earlier), encode_timestamp(&later));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(decode_timestamp(&b).unwrap(), later);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_timestamp("yesterday").is_err());
    }

    fn client_row() -> ClientRow {
        ClientRow {
            id: "c-1".to_string(),
            username: "@row".to_string(),
            name: None,
            personality: "curious".to_string(),
            stage: "interest".to_string(),
            interests: r#"["reels"]"#.to_string(),
            total_interactions: 3,
            link_clicks: 1,
            response_rate: 1.0,
            conversion_probability: 0.4,
            last_interaction: "2024-05-01T10:00:00.000000Z".to_string(),
            created_at: "2024-05-01T09:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_client_row_decodes() {
        let client = Client::try_from(client_row()).unwrap();
        assert_eq!(client.interests, vec!["reels"]);
        assert_eq!(client.total_interactions, 3);
    }

    #[test]
    fn test_corrupt_client_rows_rejected() {
        let mut row = client_row();
        row.total_interactions = -1;
        let err = Client::try_from(row).unwrap_err();
        assert!(err.to_string().contains("total_interactions"), "{}", err);

        let mut row = client_row();
        row.link_clicks = i64::from(u32::MAX) + 1;
        assert!(matches!(
            Client::try_from(row),
            Err(StorageError::Query { .. })
        ));

        let mut row = client_row();
        row.interests = "reels, stories".to_string();
        let err = Client::try_from(row).unwrap_err();
        assert!(err.to_string().contains("Invalid interests"), "{}", err);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Client, Interaction, Storage};
use crate::error::{StorageError, StorageResult};

#[derive(Default)]
struct Tables {
    clients: HashMap<String, Client>,
    // username -> client id
    usernames: HashMap<String, String>,
    interactions: HashMap<String, Vec<Interaction>>,
}

/// Process-local storage. Everything is lost when the process exits.
///
/// Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn insert_client(&mut self, client: &Client) -> StorageResult<()> {
        if self.usernames.contains_key(&client.username) {
            return Err(StorageError::DuplicateUsername {
                username: client.username.clone(),
            });
        }

        self.usernames
            .insert(client.username.clone(), client.id.clone());
        self.clients.insert(client.id.clone(), client.clone());
        Ok(())
    }

    fn replace_client(&mut self, client: &Client) -> StorageResult<()> {
        let previous_username = match self.clients.get(&client.id) {
            Some(existing) => existing.username.clone(),
            None => {
                return Err(StorageError::ClientNotFound {
                    client_id: client.id.clone(),
                })
            }
        };

        if previous_username != client.username {
            if self.usernames.contains_key(&client.username) {
                return Err(StorageError::DuplicateUsername {
                    username: client.username.clone(),
                });
            }
            self.usernames.remove(&previous_username);
            self.usernames
                .insert(client.username.clone(), client.id.clone());
        }

        self.clients.insert(client.id.clone(), client.clone());
        Ok(())
    }

    fn push_interaction(&mut self, interaction: &Interaction) -> StorageResult<()> {
        if !self.clients.contains_key(&interaction.client_id) {
            return Err(StorageError::ClientNotFound {
                client_id: interaction.client_id.clone(),
            });
        }

        self.interactions
            .entry(interaction.client_id.clone())
            .or_default()
            .push(interaction.clone());
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_client(&self, client: &Client) -> StorageResult<()> {
        self.tables.write().await.insert_client(client)
    }

    async fn get_client(&self, id: &str) -> StorageResult<Option<Client>> {
        Ok(self.tables.read().await.clients.get(id).cloned())
    }

    async fn get_client_by_username(&self, username: &str) -> StorageResult<Option<Client>> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.clients.get(id))
            .cloned())
    }

    async fn update_client(&self, client: &Client) -> StorageResult<()> {
        self.tables.write().await.replace_client(client)
    }

    async fn list_clients(&self) -> StorageResult<Vec<Client>> {
        Ok(self.tables.read().await.clients.values().cloned().collect())
    }

    async fn append_interaction(&self, interaction: &Interaction) -> StorageResult<()> {
        self.tables.write().await.push_interaction(interaction)
    }

    async fn record_exchange(
        &self,
        client: &Client,
        interaction: &Interaction,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;

        // Reject up front so a failed append never follows a client write.
        if interaction.client_id != client.id
            && !tables.clients.contains_key(&interaction.client_id)
        {
            return Err(StorageError::ClientNotFound {
                client_id: interaction.client_id.clone(),
            });
        }

        if tables.clients.contains_key(&client.id) {
            tables.replace_client(client)?;
        } else {
            tables.insert_client(client)?;
        }
        tables.push_interaction(interaction)
    }

    async fn get_client_interactions(&self, client_id: &str) -> StorageResult<Vec<Interaction>> {
        Ok(self
            .tables
            .read()
            .await
            .interactions
            .get(client_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_interactions(&self) -> StorageResult<Vec<Interaction>> {
        Ok(self
            .tables
            .read()
            .await
            .interactions
            .values()
            .flatten()
            .cloned()
            .collect())
    }

    async fn count_interactions_since(&self, since: DateTime<Utc>) -> StorageResult<usize> {
        Ok(self
            .tables
            .read()
            .await
            .interactions
            .values()
            .flatten()
            .filter(|i| i.timestamp > since)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Personality;
    use crate::storage::InteractionType;

    #[tokio::test]
    async fn test_rename_moves_username_index() {
        let storage = MemoryStorage::new();
        let mut client = Client::new("@old_name", Personality::Curious);
        storage.create_client(&client).await.unwrap();

        client.username = "@new_name".to_string();
        storage.update_client(&client).await.unwrap();

        assert!(storage
            .get_client_by_username("@old_name")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            storage
                .get_client_by_username("@new_name")
                .await
                .unwrap()
                .unwrap()
                .id,
            client.id
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        let client = Client::new("@shared", Personality::Hesitant);
        storage.create_client(&client).await.unwrap();
        other
            .append_interaction(&Interaction::new(&client.id, InteractionType::Dm, "hi"))
            .await
            .unwrap();

        assert_eq!(storage.list_interactions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_exchange_inserts_then_replaces() {
        let storage = MemoryStorage::new();
        let mut client = Client::new("@exchange", Personality::Curious);
        client.record_interaction(Personality::Curious, Utc::now());

        storage
            .record_exchange(&client, &Interaction::new(&client.id, InteractionType::Dm, "one"))
            .await
            .unwrap();
        client.record_interaction(Personality::Skeptical, Utc::now());
        storage
            .record_exchange(&client, &Interaction::new(&client.id, InteractionType::Dm, "two"))
            .await
            .unwrap();

        let stored = storage.get_client(&client.id).await.unwrap().unwrap();
        assert_eq!(stored.total_interactions, 2);
        assert_eq!(stored.personality, Personality::Skeptical);
        assert_eq!(storage.list_clients().await.unwrap().len(), 1);
        assert_eq!(
            storage.get_client_interactions(&client.id).await.unwrap().len(),
            2
        );
    }
}

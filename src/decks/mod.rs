//! Deck aggregate operations: a deck together with its ordered cards is
//! loaded, copied, created and deleted as one logical unit.
//!
//! The store has no transaction spanning several calls, so every operation
//! is a sequence of independent remote calls. Writes that touch more than one
//! collection run as a saga: completed steps are undone when a later step
//! fails, and a failed undo is reported as [`DeckError::PartialFailure`].

mod copier;
mod deleter;
mod reader;
mod saga;

use crate::database::{Column, Filter, OrderBy, PersistenceClient};
use crate::error::{DeckError, StoreError};
use crate::models::Deck;
use std::sync::Arc;
use tracing::instrument;

pub struct DeckRepository<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> Clone for DeckRepository<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: PersistenceClient + ?Sized> DeckRepository<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Decks owned by the current identity, newest first.
    #[instrument(skip(self))]
    pub async fn list_owned(&self) -> Result<Vec<Deck>, DeckError> {
        let identity = self.client.current_identity().await?;
        let decks = self
            .client
            .fetch_decks(
                &Filter::eq(Column::UserId, identity.user_id()),
                &OrderBy::desc(Column::CreatedAt),
            )
            .await?;
        Ok(decks)
    }

    /// Public decks of every owner, newest first.
    #[instrument(skip(self))]
    pub async fn list_public(&self) -> Result<Vec<Deck>, DeckError> {
        let decks = self
            .client
            .fetch_decks(
                &Filter::eq(Column::IsPublic, true),
                &OrderBy::desc(Column::CreatedAt),
            )
            .await?;
        Ok(decks)
    }
}

/// Maps a failed single-deck fetch: zero rows means the deck does not exist.
fn deck_fetch_error(err: StoreError, deck_id: &str) -> DeckError {
    match err {
        StoreError::NoRows => DeckError::NotFound(deck_id.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::database::PersistenceClient;
    use crate::models::{Deck, NewCard, NewDeck};

    /// Inserts a deck owned by `user_id` with `(position, term, definition)` cards.
    pub async fn seed<C: PersistenceClient + ?Sized>(
        client: &C,
        user_id: &str,
        name: &str,
        cards: &[(i64, &str, &str)],
    ) -> Deck {
        let deck = client
            .insert_deck(NewDeck {
                user_id: user_id.to_string(),
                name: name.to_string(),
                description: Some(format!("{name} description")),
                is_public: true,
            })
            .await
            .unwrap();

        if !cards.is_empty() {
            let rows = cards
                .iter()
                .map(|(position, term, definition)| NewCard {
                    deck_id: deck.id.clone(),
                    term: term.to_string(),
                    definition: definition.to_string(),
                    position: *position,
                })
                .collect();
            client.insert_cards(rows).await.unwrap();
        }
        deck
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::seed;
    use super::*;
    use crate::database::{MemoryClient, SqliteClient};

    #[tokio::test]
    async fn test_list_owned_returns_only_own_decks() {
        let client = Arc::new(MemoryClient::signed_in("alice"));
        seed(client.as_ref(), "alice", "Mine", &[]).await;
        seed(client.as_ref(), "bob", "Theirs", &[]).await;
        let repo = DeckRepository::new(client);

        let decks = repo.list_owned().await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_list_owned_requires_identity() {
        let repo = DeckRepository::new(Arc::new(MemoryClient::new()));
        assert!(matches!(
            repo.list_owned().await,
            Err(DeckError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_list_public_skips_private_decks() {
        let client = Arc::new(SqliteClient::open_in_memory().unwrap());
        let public = seed(client.as_ref(), "alice", "Open", &[]).await;
        client
            .insert_deck(crate::models::NewDeck {
                user_id: "bob".to_string(),
                name: "Hidden".to_string(),
                description: None,
                is_public: false,
            })
            .await
            .unwrap();
        let repo = DeckRepository::new(client);

        let decks = repo.list_public().await.unwrap();
        assert_eq!(decks, vec![public]);
    }

    #[tokio::test]
    async fn test_repository_works_behind_trait_object() {
        let client: Arc<dyn PersistenceClient> = Arc::new(MemoryClient::signed_in("alice"));
        let deck = seed(client.as_ref(), "alice", "Dyn", &[(1, "a", "1")]).await;
        let repo = DeckRepository::new(client);

        let loaded = repo.load(&deck.id).await.unwrap();
        assert_eq!(loaded.cards.len(), 1);
    }
}

use super::{DeckRepository, deck_fetch_error};
use crate::database::{Filter, OrderBy, PersistenceClient};
use crate::error::DeckError;
use crate::models::DeckWithCards;
use tracing::{debug, instrument};

impl<C: PersistenceClient + ?Sized> DeckRepository<C> {
    /// Loads a deck and its cards ordered by ascending position.
    ///
    /// A failed deck fetch skips the card fetch. An empty identifier is
    /// reported as `NotFound` without calling the store.
    #[instrument(skip(self))]
    pub async fn load(&self, deck_id: &str) -> Result<DeckWithCards, DeckError> {
        if deck_id.is_empty() {
            return Err(DeckError::NotFound(String::new()));
        }

        let deck = self
            .client
            .fetch_deck(&Filter::id(deck_id))
            .await
            .map_err(|err| deck_fetch_error(err, deck_id))?;

        let cards = self
            .client
            .fetch_cards(&Filter::deck_id(deck_id), &OrderBy::by_position())
            .await?;

        debug!(cards = cards.len(), "deck loaded");
        Ok(DeckWithCards { deck, cards })
    }
}

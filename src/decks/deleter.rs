use super::DeckRepository;
use crate::database::{Filter, PersistenceClient};
use crate::error::DeckError;
use tracing::{debug, info, instrument, warn};

impl<C: PersistenceClient + ?Sized> DeckRepository<C> {
    /// Deletes a deck, then all of its cards.
    ///
    /// Deleting a deck that is already gone succeeds, and its cards are
    /// still cleared. A failed deck delete skips the card delete. A card
    /// delete that fails after the deck row was removed is reported as
    /// `PartialFailure`.
    #[instrument(skip(self))]
    pub async fn delete(&self, deck_id: &str) -> Result<(), DeckError> {
        if deck_id.is_empty() {
            return Err(DeckError::NotFound(String::new()));
        }

        let removed = self.client.delete_decks(&Filter::id(deck_id)).await?;
        if removed == 0 {
            debug!("deck already gone, clearing leftover cards");
        }

        match self.client.delete_cards(&Filter::deck_id(deck_id)).await {
            Ok(cards) => {
                info!(cards, "deck deleted");
                Ok(())
            }
            Err(err) if removed > 0 => {
                warn!(error = %err, "deck removed but its cards were not");
                Err(DeckError::PartialFailure {
                    deck_id: deck_id.to_string(),
                    cause: err,
                    compensation: None,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

use super::saga::Saga;
use super::{DeckRepository, deck_fetch_error};
use crate::database::{Filter, OrderBy, PersistenceClient};
use crate::error::{DeckError, ValidationError};
use crate::models::{NewAggregate, NewCard, NewDeck};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

impl<C: PersistenceClient + ?Sized> DeckRepository<C> {
    /// Copies a deck and its cards under the current identity.
    ///
    /// Checked in order: the identity must resolve, then the source deck
    /// must exist. The copy is named `"Copy of <name>"` and its cards keep the
    /// source positions verbatim. Each call creates a new deck; the new
    /// deck's id is returned.
    #[instrument(skip(self))]
    pub async fn copy(&self, deck_id: &str) -> Result<String, DeckError> {
        let identity = self.client.current_identity().await?;

        if deck_id.is_empty() {
            return Err(DeckError::NotFound(String::new()));
        }
        let source = self
            .client
            .fetch_deck(&Filter::id(deck_id))
            .await
            .map_err(|err| deck_fetch_error(err, deck_id))?;
        let source_cards = self
            .client
            .fetch_cards(&Filter::deck_id(deck_id), &OrderBy::by_position())
            .await?;

        let mut saga = Saga::new(&*self.client);
        let copy = self
            .client
            .insert_deck(NewDeck::copy_of(&source, identity.user_id()))
            .await?;
        saga.deck_inserted(&copy.id);
        debug!(new_deck_id = %copy.id, "deck row copied");

        if !source_cards.is_empty() {
            let cards = source_cards
                .iter()
                .map(|card| NewCard::copied_from(card, &copy.id))
                .collect();
            if let Err(err) = self.client.insert_cards(cards).await {
                return Err(saga.abort(err).await);
            }
            saga.cards_inserted(&copy.id);
        }

        info!(
            new_deck_id = %copy.id,
            cards = source_cards.len(),
            "deck copied"
        );
        Ok(copy.id)
    }

    /// Creates a deck with its cards under the current identity.
    #[instrument(skip(self, aggregate), fields(name = %aggregate.name))]
    pub async fn create(&self, aggregate: NewAggregate) -> Result<String, DeckError> {
        validate(&aggregate)?;
        let identity = self.client.current_identity().await?;

        let mut saga = Saga::new(&*self.client);
        let deck = self
            .client
            .insert_deck(NewDeck {
                user_id: identity.user_id().to_string(),
                name: aggregate.name,
                description: aggregate.description,
                is_public: aggregate.is_public,
            })
            .await?;
        saga.deck_inserted(&deck.id);

        let count = aggregate.cards.len();
        if count > 0 {
            let cards = aggregate
                .cards
                .into_iter()
                .map(|card| NewCard {
                    deck_id: deck.id.clone(),
                    term: card.term,
                    definition: card.definition,
                    position: card.position,
                })
                .collect();
            if let Err(err) = self.client.insert_cards(cards).await {
                return Err(saga.abort(err).await);
            }
            saga.cards_inserted(&deck.id);
        }

        info!(deck_id = %deck.id, cards = count, "deck created");
        Ok(deck.id)
    }
}

fn validate(aggregate: &NewAggregate) -> Result<(), ValidationError> {
    if aggregate.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let mut positions = HashSet::new();
    for (index, card) in aggregate.cards.iter().enumerate() {
        if card.term.trim().is_empty() || card.definition.trim().is_empty() {
            return Err(ValidationError::IncompleteCard(index + 1));
        }
        if !positions.insert(card.position) {
            return Err(ValidationError::DuplicatePosition(card.position));
        }
    }
    Ok(())
}

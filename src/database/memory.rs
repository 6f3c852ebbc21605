//! In-process store with the same contract as the SQLite client.
//!
//! Every call is recorded, and any [`Operation`] can be made to fail, so the
//! failure path of each remote step can be driven from tests.

use super::{
    Collection, Column, Filter, Operation, OrderBy, PersistenceClient, StoreResult, Value,
};
use crate::error::StoreError;
use crate::models::{Card, Deck, Identity, NewCard, NewDeck};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    decks: Vec<Deck>,
    cards: Vec<Card>,
    identity: Option<Identity>,
    failures: HashSet<Operation>,
    calls: Vec<Operation>,
}

impl State {
    /// Records the call and fails it if a failure was injected for it.
    fn enter(&mut self, op: Operation) -> StoreResult<()> {
        self.calls.push(op);
        if self.failures.contains(&op) {
            return Err(StoreError::Injected(op));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryClient {
    state: RwLock<State>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client with `user_id` already signed in.
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            state: RwLock::new(State {
                identity: Some(Identity::new(user_id)),
                ..Default::default()
            }),
        }
    }

    pub async fn sign_in(&self, user_id: &str) {
        self.state.write().await.identity = Some(Identity::new(user_id));
    }

    pub async fn sign_out(&self) {
        self.state.write().await.identity = None;
    }

    /// Makes every later call of `op` fail with [`StoreError::Injected`].
    pub async fn fail_on(&self, op: Operation) {
        self.state.write().await.failures.insert(op);
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    /// Operations called so far, in call order.
    pub async fn calls(&self) -> Vec<Operation> {
        self.state.read().await.calls.clone()
    }

    pub async fn decks(&self) -> Vec<Deck> {
        self.state.read().await.decks.clone()
    }

    pub async fn cards(&self) -> Vec<Card> {
        self.state.read().await.cards.clone()
    }
}

fn deck_value(deck: &Deck, column: Column) -> Value {
    match column {
        Column::Id => deck.id.clone().into(),
        Column::UserId => deck.user_id.clone().into(),
        Column::Name => deck.name.clone().into(),
        Column::Description => deck.description.clone().into(),
        Column::CreatedAt => deck.created_at.clone().into(),
        Column::IsPublic => deck.is_public.into(),
        _ => Value::Null,
    }
}

fn card_value(card: &Card, column: Column) -> Value {
    match column {
        Column::Id => card.id.clone().into(),
        Column::DeckId => card.deck_id.clone().into(),
        Column::Term => card.term.clone().into(),
        Column::Definition => card.definition.clone().into(),
        Column::Position => card.position.into(),
        _ => Value::Null,
    }
}

fn compare(a: &Value, b: &Value, order: &OrderBy) -> Ordering {
    if order.ascending { a.cmp(b) } else { b.cmp(a) }
}

#[async_trait]
impl PersistenceClient for MemoryClient {
    async fn fetch_deck(&self, filter: &Filter) -> StoreResult<Deck> {
        let mut state = self.state.write().await;
        state.enter(Operation::FetchDeck)?;
        Collection::Decks.check(filter.column)?;

        let mut matches = state
            .decks
            .iter()
            .filter(|deck| deck_value(deck, filter.column) == filter.value);
        match (matches.next(), matches.next()) {
            (Some(deck), None) => Ok(deck.clone()),
            (None, _) => Err(StoreError::NoRows),
            (Some(_), Some(_)) => Err(StoreError::Backend(
                "more than one deck matched the filter".to_string(),
            )),
        }
    }

    async fn fetch_decks(&self, filter: &Filter, order: &OrderBy) -> StoreResult<Vec<Deck>> {
        let mut state = self.state.write().await;
        state.enter(Operation::FetchDecks)?;
        Collection::Decks.check(filter.column)?;
        Collection::Decks.check(order.column)?;

        let mut decks: Vec<Deck> = state
            .decks
            .iter()
            .filter(|deck| deck_value(deck, filter.column) == filter.value)
            .cloned()
            .collect();
        decks.sort_by(|a, b| {
            compare(
                &deck_value(a, order.column),
                &deck_value(b, order.column),
                order,
            )
        });
        Ok(decks)
    }

    async fn fetch_cards(&self, filter: &Filter, order: &OrderBy) -> StoreResult<Vec<Card>> {
        let mut state = self.state.write().await;
        state.enter(Operation::FetchCards)?;
        Collection::Cards.check(filter.column)?;
        Collection::Cards.check(order.column)?;

        let mut cards: Vec<Card> = state
            .cards
            .iter()
            .filter(|card| card_value(card, filter.column) == filter.value)
            .cloned()
            .collect();
        cards.sort_by(|a, b| {
            compare(
                &card_value(a, order.column),
                &card_value(b, order.column),
                order,
            )
        });
        Ok(cards)
    }

    async fn insert_deck(&self, deck: NewDeck) -> StoreResult<Deck> {
        let mut state = self.state.write().await;
        state.enter(Operation::InsertDeck)?;

        let deck = Deck {
            id: Uuid::new_v4().to_string(),
            user_id: deck.user_id,
            name: deck.name,
            description: deck.description,
            created_at: Utc::now().to_rfc3339(),
            is_public: deck.is_public,
        };
        state.decks.push(deck.clone());
        Ok(deck)
    }

    async fn insert_cards(&self, cards: Vec<NewCard>) -> StoreResult<Vec<Card>> {
        let mut state = self.state.write().await;
        state.enter(Operation::InsertCards)?;

        // Check the whole batch first so a conflict leaves nothing behind.
        let mut taken: HashSet<(String, i64)> = state
            .cards
            .iter()
            .map(|card| (card.deck_id.clone(), card.position))
            .collect();
        for card in &cards {
            if card.deck_id.is_empty() {
                return Err(StoreError::Backend("card deck_id must not be empty".into()));
            }
            if !taken.insert((card.deck_id.clone(), card.position)) {
                return Err(StoreError::Backend(format!(
                    "duplicate position {} in deck {}",
                    card.position, card.deck_id
                )));
            }
        }

        let inserted: Vec<Card> = cards
            .into_iter()
            .map(|card| Card {
                id: Uuid::new_v4().to_string(),
                deck_id: card.deck_id,
                term: card.term,
                definition: card.definition,
                position: card.position,
            })
            .collect();
        state.cards.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn delete_decks(&self, filter: &Filter) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        state.enter(Operation::DeleteDecks)?;
        Collection::Decks.check(filter.column)?;

        let before = state.decks.len();
        state
            .decks
            .retain(|deck| deck_value(deck, filter.column) != filter.value);
        Ok(before - state.decks.len())
    }

    async fn delete_cards(&self, filter: &Filter) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        state.enter(Operation::DeleteCards)?;
        Collection::Cards.check(filter.column)?;

        let before = state.cards.len();
        state
            .cards
            .retain(|card| card_value(card, filter.column) != filter.value);
        Ok(before - state.cards.len())
    }

    async fn current_identity(&self) -> StoreResult<Identity> {
        let mut state = self.state.write().await;
        state.enter(Operation::CurrentIdentity)?;
        state.identity.clone().ok_or(StoreError::Unauthenticated)
    }
}

//! Persistence client contract for the `decks` and `cards` collections.
//!
//! The deck operations are written against [`PersistenceClient`] only. Two
//! implementations ship with the crate: [`SqliteClient`] for durable storage
//! and [`MemoryClient`] for tests and fault injection.

pub mod memory;
pub mod sqlite;

use crate::error::StoreError;
use crate::models::{Card, Deck, Identity, NewCard, NewDeck};
use async_trait::async_trait;
use std::fmt;

pub use memory::MemoryClient;
pub use sqlite::SqliteClient;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Decks,
    Cards,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Decks => "decks",
            Collection::Cards => "cards",
        }
    }

    pub fn has_column(self, column: Column) -> bool {
        use Column::*;
        match self {
            Collection::Decks => matches!(
                column,
                Id | UserId | Name | Description | CreatedAt | IsPublic
            ),
            Collection::Cards => matches!(column, Id | DeckId | Term | Definition | Position),
        }
    }

    /// Fails with [`StoreError::InvalidColumn`] if `column` is not part of this collection.
    pub fn check(self, column: Column) -> StoreResult<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(StoreError::InvalidColumn(column.as_str()))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Id,
    UserId,
    Name,
    Description,
    CreatedAt,
    IsPublic,
    DeckId,
    Term,
    Definition,
    Position,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::UserId => "user_id",
            Column::Name => "name",
            Column::Description => "description",
            Column::CreatedAt => "created_at",
            Column::IsPublic => "is_public",
            Column::DeckId => "deck_id",
            Column::Term => "term",
            Column::Definition => "definition",
            Column::Position => "position",
        }
    }
}

/// Column value used in filters and for ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::Text)
    }
}

/// Equality filter on one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: Column,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    pub fn id(id: &str) -> Self {
        Self::eq(Column::Id, id)
    }

    pub fn deck_id(deck_id: &str) -> Self {
        Self::eq(Column::DeckId, deck_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// Display order of cards within a deck.
    pub fn by_position() -> Self {
        Self::asc(Column::Position)
    }
}

/// Remote call kinds, used for logging and fault injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchDeck,
    FetchDecks,
    FetchCards,
    InsertDeck,
    InsertCards,
    DeleteDecks,
    DeleteCards,
    CurrentIdentity,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::FetchDeck => "fetch deck",
            Operation::FetchDecks => "fetch decks",
            Operation::FetchCards => "fetch cards",
            Operation::InsertDeck => "insert deck",
            Operation::InsertCards => "insert cards",
            Operation::DeleteDecks => "delete decks",
            Operation::DeleteCards => "delete cards",
            Operation::CurrentIdentity => "current identity",
        };
        f.write_str(name)
    }
}

/// Access handle to the remote store.
///
/// Row-level access rules are enforced by the store itself. Calls are
/// independent: the store offers no transaction spanning several of them.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Fetches exactly one deck.
    ///
    /// # Errors
    ///
    /// - `NoRows` if nothing matches, `Backend` if more than one row matches
    async fn fetch_deck(&self, filter: &Filter) -> StoreResult<Deck>;

    async fn fetch_decks(&self, filter: &Filter, order: &OrderBy) -> StoreResult<Vec<Deck>>;

    async fn fetch_cards(&self, filter: &Filter, order: &OrderBy) -> StoreResult<Vec<Card>>;

    /// Inserts one deck; the store assigns `id` and `created_at`.
    async fn insert_deck(&self, deck: NewDeck) -> StoreResult<Deck>;

    /// Inserts all cards or none of them.
    async fn insert_cards(&self, cards: Vec<NewCard>) -> StoreResult<Vec<Card>>;

    /// Returns the number of rows removed. Matching zero rows is not an error.
    async fn delete_decks(&self, filter: &Filter) -> StoreResult<usize>;

    async fn delete_cards(&self, filter: &Filter) -> StoreResult<usize>;

    /// # Errors
    ///
    /// - `Unauthenticated` if no user is signed in
    async fn current_identity(&self) -> StoreResult<Identity>;
}

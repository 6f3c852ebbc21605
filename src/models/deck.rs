//! Deck is a named, owned set of cards
use super::Card;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub is_public: bool,
}

/// Deck row before the store has assigned `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeck {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
}

impl NewDeck {
    /// Prefix given to the name of every copied deck.
    pub const COPY_PREFIX: &'static str = "Copy of ";

    /// Builds the row for a copy of `source` owned by `user_id`.
    pub fn copy_of(source: &Deck, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: format!("{}{}", Self::COPY_PREFIX, source.name),
            description: source.description.clone(),
            is_public: source.is_public,
        }
    }
}

/// A deck together with its cards ordered by ascending position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckWithCards {
    pub deck: Deck,
    pub cards: Vec<Card>,
}

/// Card content of an aggregate that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    pub term: String,
    pub definition: String,
    pub position: i64,
}

/// Deck plus cards to be created in one go under the current identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAggregate {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub cards: Vec<CardContent>,
}

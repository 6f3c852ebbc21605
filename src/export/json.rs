//! JSON import/export for deck aggregates.
//! Provides functionality to save a stored deck to a JSON file and to read one
//! back as a new aggregate ready for creation.

use crate::error::DeckError;
use crate::models::{CardContent, DeckWithCards, NewAggregate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Portable form of a deck: no identifiers, owner or timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckExport {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    pub cards: Vec<CardContent>,
}

fn default_public() -> bool {
    true
}

impl From<&DeckWithCards> for DeckExport {
    fn from(aggregate: &DeckWithCards) -> Self {
        Self {
            name: aggregate.deck.name.clone(),
            description: aggregate.deck.description.clone(),
            is_public: aggregate.deck.is_public,
            cards: aggregate
                .cards
                .iter()
                .map(|card| CardContent {
                    term: card.term.clone(),
                    definition: card.definition.clone(),
                    position: card.position,
                })
                .collect(),
        }
    }
}

impl DeckExport {
    pub fn into_new_aggregate(self) -> NewAggregate {
        NewAggregate {
            name: self.name,
            description: self.description,
            is_public: self.is_public,
            cards: self.cards,
        }
    }
}

/// Exports a deck to a JSON file at the specified path.
/// Returns an error if file creation or writing fails.
pub fn export_json_to_path(
    aggregate: &DeckWithCards,
    path: impl AsRef<Path>,
) -> Result<(), DeckError> {
    let json_string = serde_json::to_string_pretty(&DeckExport::from(aggregate))?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    info!(deck = %aggregate.deck.name, path = %path.as_ref().display(), "deck exported");
    Ok(())
}

/// Imports a deck from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: impl AsRef<Path>) -> Result<DeckExport, DeckError> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: DeckExport = serde_json::from_str(&contents)?;

    info!(deck = %deck.name, path = %path.as_ref().display(), "deck imported");
    Ok(deck)
}

//! Uniform success/failure envelopes for page loaders and UI actions.
//!
//! Each envelope carries either the success payload or the original
//! [`DeckError`], never both. Serialized, the error is rendered as
//! `{ kind, message, status }`.

use crate::error::DeckError;
use crate::models::{Card, Deck, DeckWithCards};
use serde::{Serialize, Serializer};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    pub status: u16,
}

impl From<&DeckError> for ErrorReport {
    fn from(err: &DeckError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status_code(),
        }
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<DeckError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    error.as_ref().map(ErrorReport::from).serialize(serializer)
}

/// Outcome of loading a deck: `{ deck, cards, error }`.
#[derive(Debug, Serialize)]
pub struct LoadEnvelope {
    pub deck: Option<Deck>,
    pub cards: Option<Vec<Card>>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<DeckError>,
}

impl From<Result<DeckWithCards, DeckError>> for LoadEnvelope {
    fn from(result: Result<DeckWithCards, DeckError>) -> Self {
        match result {
            Ok(DeckWithCards { deck, cards }) => Self {
                deck: Some(deck),
                cards: Some(cards),
                error: None,
            },
            Err(err) => Self {
                deck: None,
                cards: None,
                error: Some(err),
            },
        }
    }
}

/// Outcome of copying or creating a deck: `{ id, error }`.
#[derive(Debug, Serialize)]
pub struct CopyEnvelope {
    pub id: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<DeckError>,
}

impl From<Result<String, DeckError>> for CopyEnvelope {
    fn from(result: Result<String, DeckError>) -> Self {
        match result {
            Ok(id) => Self {
                id: Some(id),
                error: None,
            },
            Err(err) => Self {
                id: None,
                error: Some(err),
            },
        }
    }
}

/// Outcome of deleting a deck: `{ error }`, with `error` null on success.
#[derive(Debug, Serialize)]
pub struct DeleteEnvelope {
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<DeckError>,
}

impl From<Result<(), DeckError>> for DeleteEnvelope {
    fn from(result: Result<(), DeckError>) -> Self {
        Self { error: result.err() }
    }
}

/// HTTP-style status for an envelope's error slot: 200 when there is none.
pub fn status_of(error: Option<&DeckError>) -> u16 {
    error.map_or(200, DeckError::status_code)
}

impl LoadEnvelope {
    pub fn status(&self) -> u16 {
        status_of(self.error.as_ref())
    }
}

impl CopyEnvelope {
    pub fn status(&self) -> u16 {
        status_of(self.error.as_ref())
    }
}

impl DeleteEnvelope {
    pub fn status(&self) -> u16 {
        status_of(self.error.as_ref())
    }
}

//! Error types for the store layer and the deck operations built on it.

use crate::database::Operation;
use thiserror::Error;

/// Faults surfaced by a persistence client.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no rows matched the filter")]
    NoRows,

    #[error("no authenticated user")]
    Unauthenticated,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid column '{0}' for this collection")]
    InvalidColumn(&'static str),

    #[error("injected failure on {0}")]
    Injected(Operation),

    #[error("store error: {0}")]
    Backend(String),
}

/// Reasons an aggregate cannot be built from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("deck name must not be empty")]
    EmptyName,

    #[error("deck needs at least one card")]
    NoCards,

    #[error("card {0} needs both a term and a definition")]
    IncompleteCard(usize),

    #[error("position {0} is used by more than one card")]
    DuplicatePosition(i64),
}

/// Failure of a deck aggregate operation.
///
/// The original cause is always attached unmodified so callers can decide
/// how to present it.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("deck not found: '{0}'")]
    NotFound(String),

    #[error("no authenticated user")]
    Unauthenticated,

    #[error(transparent)]
    Store(StoreError),

    /// A multi-step write stopped halfway and the completed steps could not
    /// be undone. `deck_id` names the row left behind.
    #[error("deck '{deck_id}' partially written: {cause}")]
    PartialFailure {
        deck_id: String,
        #[source]
        cause: StoreError,
        compensation: Option<StoreError>,
    },

    #[error("invalid deck: {0}")]
    Invalid(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeckError {
    /// HTTP-style status a page loader should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DeckError::NotFound(_) => 404,
            DeckError::Unauthenticated => 401,
            DeckError::Invalid(_) | DeckError::Json(_) => 400,
            _ => 500,
        }
    }

    /// Stable short name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DeckError::NotFound(_) => "not_found",
            DeckError::Unauthenticated => "unauthenticated",
            DeckError::Store(_) => "store",
            DeckError::PartialFailure { .. } => "partial_failure",
            DeckError::Invalid(_) | DeckError::Json(_) => "invalid_input",
            DeckError::Io(_) => "io",
        }
    }
}

impl From<StoreError> for DeckError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthenticated => DeckError::Unauthenticated,
            other => DeckError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_store_error_maps_to_unauthenticated() {
        let err: DeckError = StoreError::Unauthenticated.into();
        assert!(matches!(err, DeckError::Unauthenticated));
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DeckError::NotFound("x".into()).status_code(), 404);
        assert_eq!(DeckError::from(ValidationError::EmptyName).status_code(), 400);
        assert_eq!(
            DeckError::Store(StoreError::Backend("down".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_partial_failure_keeps_cause() {
        let err = DeckError::PartialFailure {
            deck_id: "d1".into(),
            cause: StoreError::Injected(Operation::InsertCards),
            compensation: None,
        };

        assert_eq!(err.kind(), "partial_failure");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("injected failure on insert cards"));
    }
}

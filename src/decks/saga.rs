//! Step log for multi-step aggregate writes.

use crate::database::{Filter, PersistenceClient};
use crate::error::{DeckError, StoreError};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    DeckInserted(String),
    CardsInserted(String),
}

/// Records completed inserts so they can be undone in reverse order.
pub(super) struct Saga<'a, C: ?Sized> {
    client: &'a C,
    steps: Vec<Step>,
}

impl<'a, C: PersistenceClient + ?Sized> Saga<'a, C> {
    pub(super) fn new(client: &'a C) -> Self {
        Self {
            client,
            steps: Vec::new(),
        }
    }

    pub(super) fn deck_inserted(&mut self, deck_id: &str) {
        self.steps.push(Step::DeckInserted(deck_id.to_string()));
    }

    pub(super) fn cards_inserted(&mut self, deck_id: &str) {
        self.steps.push(Step::CardsInserted(deck_id.to_string()));
    }

    /// Undoes the recorded steps after `cause` stopped the sequence.
    ///
    /// Returns `cause` itself when nothing was written or everything was
    /// undone, and `PartialFailure` when an undo step failed.
    pub(super) async fn abort(mut self, cause: StoreError) -> DeckError {
        // A failed card batch may have landed partially; clear it too.
        let deck_id = match self.steps.first() {
            Some(Step::DeckInserted(id)) => id.clone(),
            _ => return cause.into(),
        };
        if !self.steps.contains(&Step::CardsInserted(deck_id.clone())) {
            self.steps.insert(1, Step::CardsInserted(deck_id.clone()));
        }

        warn!(%deck_id, error = %cause, "aggregate write failed, undoing completed steps");
        while let Some(step) = self.steps.pop() {
            let undone = match &step {
                Step::CardsInserted(id) => self.client.delete_cards(&Filter::deck_id(id)).await,
                Step::DeckInserted(id) => self.client.delete_decks(&Filter::id(id)).await,
            };
            match undone {
                Ok(removed) => debug!(?step, removed, "step undone"),
                Err(err) => {
                    warn!(?step, error = %err, "undo failed, deck left partially written");
                    return DeckError::PartialFailure {
                        deck_id,
                        cause,
                        compensation: Some(err),
                    };
                }
            }
        }
        cause.into()
    }
}

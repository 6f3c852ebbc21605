//! Editing-session state for a deck that is being written.
//! Owned by whoever drives the form and reset when the session ends.

use super::{CardContent, NewAggregate};
use crate::error::ValidationError;

/// Number of blank rows a fresh draft starts with.
const INITIAL_ROWS: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftCard {
    pub id: u32,
    pub term: String,
    pub definition: String,
}

impl DraftCard {
    fn is_blank(&self) -> bool {
        self.term.trim().is_empty() && self.definition.trim().is_empty()
    }

    fn is_complete(&self) -> bool {
        !self.term.trim().is_empty() && !self.definition.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeckDraft {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub cards: Vec<DraftCard>,
    next_id: u32,
}

impl Default for DeckDraft {
    fn default() -> Self {
        let mut draft = Self {
            name: String::new(),
            description: String::new(),
            is_public: true,
            cards: Vec::new(),
            next_id: 1,
        };
        for _ in 0..INITIAL_ROWS {
            draft.add_card();
        }
        draft
    }
}

impl DeckDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a blank row and returns its id.
    pub fn add_card(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.cards.push(DraftCard {
            id,
            ..Default::default()
        });
        id
    }

    /// Removes the row with `id`. Returns false if no such row exists.
    pub fn remove_card(&mut self, id: u32) -> bool {
        let before = self.cards.len();
        self.cards.retain(|card| card.id != id);
        self.cards.len() != before
    }

    pub fn set_card(&mut self, id: u32, term: &str, definition: &str) -> bool {
        match self.cards.iter_mut().find(|card| card.id == id) {
            Some(card) => {
                card.term = term.to_string();
                card.definition = definition.to_string();
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks the draft without consuming it.
    ///
    /// Fully blank rows are ignored; half-filled rows are reported by their
    /// 1-based row number.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut filled = 0;
        for (row, card) in self.cards.iter().enumerate() {
            if card.is_blank() {
                continue;
            }
            if !card.is_complete() {
                return Err(ValidationError::IncompleteCard(row + 1));
            }
            filled += 1;
        }

        if filled == 0 {
            return Err(ValidationError::NoCards);
        }
        Ok(())
    }

    /// Turns the draft into an aggregate ready for creation.
    /// Positions follow draft order starting at 1.
    pub fn into_new_aggregate(self) -> Result<NewAggregate, ValidationError> {
        self.validate()?;

        let description = self.description.trim();
        let cards = self
            .cards
            .into_iter()
            .filter(|card| !card.is_blank())
            .zip(1..)
            .map(|(card, position)| CardContent {
                term: card.term.trim().to_string(),
                definition: card.definition.trim().to_string(),
                position,
            })
            .collect();

        Ok(NewAggregate {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            is_public: self.is_public,
            cards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_has_two_blank_rows() {
        let draft = DeckDraft::new();

        assert_eq!(draft.cards.len(), 2);
        assert!(draft.is_public);
        assert_eq!(draft.cards[0].id, 1);
        assert_eq!(draft.cards[1].id, 2);
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut draft = DeckDraft::new();
        assert!(draft.remove_card(2));
        assert!(!draft.remove_card(2));

        let id = draft.add_card();
        assert_eq!(id, 3);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let mut draft = DeckDraft::new();
        draft.set_card(1, "a", "1");

        assert_eq!(draft.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_validate_rejects_half_filled_row() {
        let mut draft = DeckDraft::new();
        draft.name = "Verbs".to_string();
        draft.set_card(1, "a", "1");
        draft.set_card(2, "b", "  ");

        assert_eq!(draft.validate(), Err(ValidationError::IncompleteCard(2)));
    }

    #[test]
    fn test_validate_rejects_only_blank_rows() {
        let mut draft = DeckDraft::new();
        draft.name = "Verbs".to_string();

        assert_eq!(draft.validate(), Err(ValidationError::NoCards));
    }

    #[test]
    fn test_into_new_aggregate_skips_blank_rows_and_numbers_positions() {
        let mut draft = DeckDraft::new();
        draft.name = " Verbs ".to_string();
        let third = draft.add_card();
        draft.set_card(1, "be", "być");
        draft.set_card(third, "have", "mieć");

        let aggregate = draft.into_new_aggregate().unwrap();

        assert_eq!(aggregate.name, "Verbs");
        assert_eq!(aggregate.description, None);
        assert_eq!(aggregate.cards.len(), 2);
        assert_eq!(aggregate.cards[0].term, "be");
        assert_eq!(aggregate.cards[0].position, 1);
        assert_eq!(aggregate.cards[1].term, "have");
        assert_eq!(aggregate.cards[1].position, 2);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut draft = DeckDraft::new();
        draft.name = "Verbs".to_string();
        draft.is_public = false;
        draft.add_card();

        draft.reset();

        assert_eq!(draft, DeckDraft::new());
    }
}

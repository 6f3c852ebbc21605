//! Card is a pair <term, definition> placed at a position inside one deck
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub term: String,
    pub definition: String,
    pub position: i64,
}

/// Card row before the store has assigned its identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub deck_id: String,
    pub term: String,
    pub definition: String,
    pub position: i64,
}

impl NewCard {
    /// Builds a copy of `card` that belongs to `deck_id`, keeping its position verbatim.
    pub fn copied_from(card: &Card, deck_id: &str) -> Self {
        Self {
            deck_id: deck_id.to_string(),
            term: card.term.clone(),
            definition: card.definition.clone(),
            position: card.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card() -> Card {
        Card {
            id: "c1".to_string(),
            deck_id: "d1".to_string(),
            term: "hello".to_string(),
            definition: "cześć".to_string(),
            position: 7,
        }
    }

    #[test]
    fn test_copied_from_keeps_content_and_position() {
        let card = sample_card();
        let copy = NewCard::copied_from(&card, "d2");

        assert_eq!(copy.deck_id, "d2");
        assert_eq!(copy.term, "hello");
        assert_eq!(copy.definition, "cześć");
        assert_eq!(copy.position, 7);
    }

    #[test]
    fn test_card_serializes_with_column_names() {
        let json = serde_json::to_value(sample_card()).unwrap();

        assert_eq!(json["deck_id"], "d1");
        assert_eq!(json["position"], 7);
    }
}

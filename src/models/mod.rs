pub mod card;
pub mod deck;
pub mod draft;
pub mod identity;

pub use card::{Card, NewCard};
pub use deck::{CardContent, Deck, DeckWithCards, NewAggregate, NewDeck};
pub use draft::{DeckDraft, DraftCard};
pub use identity::Identity;

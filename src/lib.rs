pub mod config;
pub mod database;
pub mod decks;
pub mod error;
pub mod export;
pub mod models;
pub mod report;

pub use config::Config;
pub use database::{MemoryClient, PersistenceClient, SqliteClient};
pub use decks::DeckRepository;
pub use error::{DeckError, StoreError, ValidationError};
pub use models::{Card, Deck, DeckDraft, DeckWithCards, Identity, NewAggregate};
pub use report::{CopyEnvelope, DeleteEnvelope, LoadEnvelope};

//! SQLite-backed persistence client.
//!
//! Handles database initialization and the per-collection read, insert and
//! delete calls for decks and cards. Identifiers are UUID v4 strings and
//! `created_at` is an RFC 3339 timestamp, both assigned here.

use super::{Collection, Filter, Operation, OrderBy, PersistenceClient, StoreResult, Value};
use crate::error::StoreError;
use crate::models::{Card, Deck, Identity, NewCard, NewDeck};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const DECK_COLUMNS: &str = "id, user_id, name, description, created_at, is_public";
const CARD_COLUMNS: &str = "id, deck_id, term, definition, position";

/// Creates the `decks` and `cards` tables if they do not exist yet.
///
/// Cards are not removed together with their deck: the cleanup is left to
/// the caller.
pub fn init_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS decks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            deck_id TEXT NOT NULL,
            term TEXT NOT NULL,
            definition TEXT NOT NULL,
            position INTEGER NOT NULL,
            UNIQUE(deck_id, position)
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_decks_user_id ON decks(user_id)",
        (),
    )?;

    Ok(())
}

/// Recovers the guard of a poisoned mutex; the connection itself stays usable.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(flag) => ToSqlOutput::from(*flag),
            Value::Int(number) => ToSqlOutput::from(*number),
            Value::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
        })
    }
}

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
        is_public: row.get(5)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        term: row.get(2)?,
        definition: row.get(3)?,
        position: row.get(4)?,
    })
}

/// `WHERE` clause for an equality filter. `IS` also matches NULL against NULL.
fn where_clause(collection: Collection, filter: &Filter) -> StoreResult<String> {
    collection.check(filter.column)?;
    Ok(format!("WHERE {} IS ?1", filter.column.as_str()))
}

fn order_clause(collection: Collection, order: &OrderBy) -> StoreResult<String> {
    collection.check(order.column)?;
    let direction = if order.ascending { "ASC" } else { "DESC" };
    Ok(format!(
        "ORDER BY {} {direction}, rowid ASC",
        order.column.as_str()
    ))
}

pub struct SqliteClient {
    conn: Mutex<Connection>,
    identity: Mutex<Option<Identity>>,
    db_path: Option<PathBuf>,
}

impl SqliteClient {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> StoreResult<Self> {
        init_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            identity: Mutex::new(None),
            db_path,
        })
    }

    /// Database file, `None` for in-memory databases.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn sign_in(&self, user_id: &str) {
        *acquire_lock(&self.identity) = Some(Identity::new(user_id));
    }

    pub fn sign_out(&self) {
        *acquire_lock(&self.identity) = None;
    }
}

#[async_trait]
impl PersistenceClient for SqliteClient {
    async fn fetch_deck(&self, filter: &Filter) -> StoreResult<Deck> {
        debug!(op = %Operation::FetchDeck, column = filter.column.as_str());
        let sql = format!(
            "SELECT {DECK_COLUMNS} FROM decks {} LIMIT 2",
            where_clause(Collection::Decks, filter)?
        );

        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(&sql)?;
        let mut decks = stmt
            .query_map(params![filter.value], deck_from_row)?
            .collect::<rusqlite::Result<Vec<Deck>>>()?;

        match decks.len() {
            0 => Err(StoreError::NoRows),
            1 => Ok(decks.remove(0)),
            _ => Err(StoreError::Backend(
                "more than one deck matched the filter".to_string(),
            )),
        }
    }

    async fn fetch_decks(&self, filter: &Filter, order: &OrderBy) -> StoreResult<Vec<Deck>> {
        debug!(op = %Operation::FetchDecks, column = filter.column.as_str());
        let sql = format!(
            "SELECT {DECK_COLUMNS} FROM decks {} {}",
            where_clause(Collection::Decks, filter)?,
            order_clause(Collection::Decks, order)?
        );

        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(&sql)?;
        let decks = stmt
            .query_map(params![filter.value], deck_from_row)?
            .collect::<rusqlite::Result<Vec<Deck>>>()?;
        Ok(decks)
    }

    async fn fetch_cards(&self, filter: &Filter, order: &OrderBy) -> StoreResult<Vec<Card>> {
        debug!(op = %Operation::FetchCards, column = filter.column.as_str());
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards {} {}",
            where_clause(Collection::Cards, filter)?,
            order_clause(Collection::Cards, order)?
        );

        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params![filter.value], card_from_row)?
            .collect::<rusqlite::Result<Vec<Card>>>()?;
        Ok(cards)
    }

    async fn insert_deck(&self, deck: NewDeck) -> StoreResult<Deck> {
        let deck = Deck {
            id: Uuid::new_v4().to_string(),
            user_id: deck.user_id,
            name: deck.name,
            description: deck.description,
            created_at: Utc::now().to_rfc3339(),
            is_public: deck.is_public,
        };

        let conn = acquire_lock(&self.conn);
        conn.execute(
            "INSERT INTO decks (id, user_id, name, description, created_at, is_public)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                deck.id,
                deck.user_id,
                deck.name,
                deck.description,
                deck.created_at,
                deck.is_public
            ],
        )?;
        debug!(op = %Operation::InsertDeck, deck_id = %deck.id);
        Ok(deck)
    }

    async fn insert_cards(&self, cards: Vec<NewCard>) -> StoreResult<Vec<Card>> {
        if cards.iter().any(|card| card.deck_id.is_empty()) {
            return Err(StoreError::Backend("card deck_id must not be empty".into()));
        }
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(cards.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cards (id, deck_id, term, definition, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for card in cards {
                let card = Card {
                    id: Uuid::new_v4().to_string(),
                    deck_id: card.deck_id,
                    term: card.term,
                    definition: card.definition,
                    position: card.position,
                };
                stmt.execute(params![
                    card.id,
                    card.deck_id,
                    card.term,
                    card.definition,
                    card.position
                ])?;
                inserted.push(card);
            }
        }
        tx.commit()?;
        debug!(op = %Operation::InsertCards, count = inserted.len());
        Ok(inserted)
    }

    async fn delete_decks(&self, filter: &Filter) -> StoreResult<usize> {
        let sql = format!(
            "DELETE FROM {} {}",
            Collection::Decks.table(),
            where_clause(Collection::Decks, filter)?
        );
        let conn = acquire_lock(&self.conn);
        let removed = conn.execute(&sql, params![filter.value])?;
        debug!(op = %Operation::DeleteDecks, removed);
        Ok(removed)
    }

    async fn delete_cards(&self, filter: &Filter) -> StoreResult<usize> {
        let sql = format!(
            "DELETE FROM {} {}",
            Collection::Cards.table(),
            where_clause(Collection::Cards, filter)?
        );
        let conn = acquire_lock(&self.conn);
        let removed = conn.execute(&sql, params![filter.value])?;
        debug!(op = %Operation::DeleteCards, removed);
        Ok(removed)
    }

    async fn current_identity(&self) -> StoreResult<Identity> {
        acquire_lock(&self.identity)
            .clone()
            .ok_or(StoreError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Column;
    use tempfile::TempDir;

    fn new_deck(name: &str, description: Option<&str>) -> NewDeck {
        NewDeck {
            user_id: "alice".to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            is_public: false,
        }
    }

    fn new_card(deck_id: &str, term: &str, position: i64) -> NewCard {
        NewCard {
            deck_id: deck_id.to_string(),
            term: term.to_string(),
            definition: format!("{term}!"),
            position,
        }
    }

    #[tokio::test]
    async fn test_deck_round_trips_through_sqlite() {
        let client = SqliteClient::open_in_memory().unwrap();
        let deck = client
            .insert_deck(new_deck("Polish Vocabulary", None))
            .await
            .unwrap();

        let fetched = client.fetch_deck(&Filter::id(&deck.id)).await.unwrap();
        assert_eq!(fetched, deck);
        assert_eq!(fetched.description, None);
        assert!(!fetched.is_public);
    }

    #[tokio::test]
    async fn test_fetch_missing_deck_is_no_rows() {
        let client = SqliteClient::open_in_memory().unwrap();
        let err = client.fetch_deck(&Filter::id("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NoRows));
    }

    #[tokio::test]
    async fn test_cards_come_back_in_position_order() {
        let client = SqliteClient::open_in_memory().unwrap();
        client
            .insert_cards(vec![
                new_card("d1", "three", 3),
                new_card("d1", "one", 1),
                new_card("d1", "two", 2),
            ])
            .await
            .unwrap();

        let cards = client
            .fetch_cards(&Filter::deck_id("d1"), &OrderBy::by_position())
            .await
            .unwrap();
        let positions: Vec<i64> = cards.iter().map(|c| c.position).collect();
        assert_eq!(positions, [1, 2, 3]);
        assert_eq!(cards[0].term, "one");
    }

    #[tokio::test]
    async fn test_card_batch_is_all_or_nothing() {
        let client = SqliteClient::open_in_memory().unwrap();
        let result = client
            .insert_cards(vec![new_card("d1", "a", 1), new_card("d1", "b", 1)])
            .await;
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        let cards = client
            .fetch_cards(&Filter::deck_id("d1"), &OrderBy::by_position())
            .await
            .unwrap();
        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn test_cards_without_deck_id_are_rejected() {
        let client = SqliteClient::open_in_memory().unwrap();
        let result = client
            .insert_cards(vec![new_card("d1", "a", 1), new_card("", "b", 2)])
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));

        let cards = client
            .fetch_cards(&Filter::deck_id("d1"), &OrderBy::by_position())
            .await
            .unwrap();
        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_removed_rows() {
        let client = SqliteClient::open_in_memory().unwrap();
        client
            .insert_cards(vec![new_card("d1", "a", 1), new_card("d1", "b", 2)])
            .await
            .unwrap();

        assert_eq!(client.delete_cards(&Filter::deck_id("d1")).await.unwrap(), 2);
        assert_eq!(client.delete_cards(&Filter::deck_id("d1")).await.unwrap(), 0);
        assert_eq!(client.delete_decks(&Filter::id("d1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_decks_filters_on_visibility() {
        let client = SqliteClient::open_in_memory().unwrap();
        client.insert_deck(new_deck("Private", Some("x"))).await.unwrap();
        let mut public = new_deck("Public", None);
        public.is_public = true;
        client.insert_deck(public).await.unwrap();

        let decks = client
            .fetch_decks(
                &Filter::eq(Column::IsPublic, true),
                &OrderBy::asc(Column::Name),
            )
            .await
            .unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name, "Public");
    }

    #[tokio::test]
    async fn test_identity_follows_session() {
        let client = SqliteClient::open_in_memory().unwrap();
        assert!(matches!(
            client.current_identity().await,
            Err(StoreError::Unauthenticated)
        ));

        client.sign_in("alice");
        assert_eq!(client.current_identity().await.unwrap().user_id(), "alice");
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("decks.sqlite3");

        let deck_id = {
            let client = SqliteClient::open(&path).unwrap();
            assert_eq!(client.db_path(), Some(path.as_path()));
            client.insert_deck(new_deck("Kept", None)).await.unwrap().id
        };

        let client = SqliteClient::open(&path).unwrap();
        let deck = client.fetch_deck(&Filter::id(&deck_id)).await.unwrap();
        assert_eq!(deck.name, "Kept");
    }
}

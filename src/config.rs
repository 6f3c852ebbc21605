//! Runtime configuration: where the store lives and who is signed in.
//!
//! Values come from command-line flags, falling back to environment
//! variables and then to defaults.

use crate::database::SqliteClient;
use crate::error::StoreError;
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_DATABASE_PATH: &str = "db.sqlite3";

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file.
    #[arg(
        long = "db",
        env = "FLASHCARDS_DB",
        default_value = DEFAULT_DATABASE_PATH,
        global = true
    )]
    pub database_path: PathBuf,

    /// User the writes are performed as.
    #[arg(long = "user", env = "FLASHCARDS_USER", global = true)]
    pub user_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            user_id: None,
        }
    }
}

impl Config {
    /// Opens the configured store and signs in the configured user, if any.
    pub fn open_client(&self) -> Result<SqliteClient, StoreError> {
        let client = SqliteClient::open(&self.database_path)?;
        if let Some(user_id) = self.user_id.as_deref().filter(|id| !id.is_empty()) {
            client.sign_in(user_id);
        }
        debug!(path = %self.database_path.display(), user = ?self.user_id, "store opened");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::PersistenceClient;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from(["flashcards", "--db", "other.sqlite3", "--user", "alice"]);

        assert_eq!(cli.config.database_path, PathBuf::from("other.sqlite3"));
        assert_eq!(cli.config.user_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_open_client_signs_in_user() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("decks.sqlite3"),
            user_id: Some("alice".to_string()),
        };

        let client = config.open_client().unwrap();
        assert_eq!(client.current_identity().await.unwrap().user_id(), "alice");
    }

    #[tokio::test]
    async fn test_open_client_without_user_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("decks.sqlite3"),
            ..Config::default()
        };

        let client = config.open_client().unwrap();
        assert!(matches!(
            client.current_identity().await,
            Err(StoreError::Unauthenticated)
        ));
    }
}

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use flashcards_app::export::json::{export_json_to_path, import_json};
use flashcards_app::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Manage flashcard decks stored in a local SQLite database.
#[derive(Parser)]
#[command(name = "flashcards", version, about)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a deck and its cards.
    Show {
        deck_id: String,
        /// Print the `{ deck, cards, error }` envelope as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Copy a deck under the signed-in user.
    Copy { deck_id: String },
    /// Delete a deck and all of its cards.
    Delete { deck_id: String },
    /// Create a deck from `term=definition` pairs.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        private: bool,
        #[arg(long = "card", value_parser = parse_card)]
        cards: Vec<(String, String)>,
    },
    /// List decks of the signed-in user, or public decks.
    List {
        #[arg(long)]
        public: bool,
    },
    /// Write a deck to a JSON file.
    Export { deck_id: String, path: PathBuf },
    /// Create a deck from a JSON file.
    Import { path: PathBuf },
    /// Create a sample deck for the signed-in user if they have none.
    Seed,
}

fn parse_card(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(term, definition)| (term.to_string(), definition.to_string()))
        .ok_or_else(|| format!("expected term=definition, got '{value}'"))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Formats an RFC 3339 timestamp as a local YYYY-MM-DD date
fn format_created_at(created_at: &str) -> String {
    DateTime::parse_from_rfc3339(created_at)
        .map(|time| time.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

fn print_deck_line(deck: &Deck) {
    let visibility = if deck.is_public { "public" } else { "private" };
    println!(
        "{}  {} ({}, {})",
        deck.id,
        deck.name,
        visibility,
        format_created_at(&deck.created_at)
    );
}

fn print_aggregate(aggregate: &DeckWithCards) {
    let deck = &aggregate.deck;
    println!("{} ({} cards)", deck.name, aggregate.cards.len());
    if let Some(description) = &deck.description {
        println!("{description}");
    }
    println!(
        "owner: {}, created: {}",
        deck.user_id,
        format_created_at(&deck.created_at)
    );
    for card in &aggregate.cards {
        println!("  {:>3}. {} - {}", card.position, card.term, card.definition);
    }
}

/// Attaches the status a page would answer with to a failed operation.
fn page_error(err: DeckError) -> anyhow::Error {
    let status = err.status_code();
    anyhow::Error::new(err).context(format!("request failed with status {status}"))
}

/// Process exit code for a failed command, derived from the status of the
/// underlying deck error. Failures outside the deck operations exit with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    let status = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<DeckError>())
        .map(DeckError::status_code);
    match status {
        Some(400) => 2,
        Some(401) => 3,
        Some(404) => 4,
        Some(_) => 5,
        None => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = cli
        .config
        .open_client()
        .with_context(|| format!("failed to open {}", cli.config.database_path.display()))?;
    let repo = DeckRepository::new(Arc::new(client));

    match cli.command {
        Command::Show { deck_id, json } => {
            let result = repo.load(&deck_id).await;
            if json {
                let envelope = LoadEnvelope::from(result);
                println!("{}", serde_json::to_string_pretty(&envelope)?);
                if let Some(err) = envelope.error {
                    return Err(page_error(err));
                }
            } else {
                print_aggregate(&result.map_err(page_error)?);
            }
        }
        Command::Copy { deck_id } => {
            let id = repo.copy(&deck_id).await.map_err(page_error)?;
            println!("Deck copied: {id}");
        }
        Command::Delete { deck_id } => {
            repo.delete(&deck_id).await.map_err(page_error)?;
            println!("Deck '{deck_id}' deleted.");
        }
        Command::Create {
            name,
            description,
            private,
            cards,
        } => {
            let mut draft = DeckDraft::new();
            draft.name = name;
            draft.description = description.unwrap_or_default();
            draft.is_public = !private;
            draft.cards.clear();
            for (term, definition) in &cards {
                let id = draft.add_card();
                draft.set_card(id, term, definition);
            }
            let aggregate = draft
                .into_new_aggregate()
                .map_err(|err| page_error(err.into()))?;
            let id = repo.create(aggregate).await.map_err(page_error)?;
            println!("Deck created: {id}");
        }
        Command::List { public } => {
            let decks = if public {
                repo.list_public().await
            } else {
                repo.list_owned().await
            }
            .map_err(page_error)?;
            println!("{} decks", decks.len());
            for deck in &decks {
                print_deck_line(deck);
            }
        }
        Command::Export { deck_id, path } => {
            let aggregate = repo.load(&deck_id).await.map_err(page_error)?;
            export_json_to_path(&aggregate, &path)?;
            println!("Deck '{}' exported to '{}'", aggregate.deck.name, path.display());
        }
        Command::Import { path } => {
            let export = import_json(&path)?;
            let id = repo
                .create(export.into_new_aggregate())
                .await
                .map_err(page_error)?;
            println!("Deck imported from '{}': {id}", path.display());
        }
        Command::Seed => {
            if !repo.list_owned().await.map_err(page_error)?.is_empty() {
                println!("Decks already present, nothing to seed.");
                return Ok(());
            }
            let mut draft = DeckDraft::new();
            draft.name = "Polish Vocabulary".to_string();
            let pairs = [("cześć", "hello"), ("dziękuję", "thank you"), ("proszę", "please")];
            draft.cards.clear();
            for (term, definition) in pairs {
                let id = draft.add_card();
                draft.set_card(id, term, definition);
            }
            let aggregate = draft
                .into_new_aggregate()
                .map_err(|err| page_error(err.into()))?;
            let id = repo.create(aggregate).await.map_err(page_error)?;
            println!("Sample data created: {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notehub::app::NotesApp;
use notehub::client::{NotesApi, NotesClient};
use notehub::clock::SystemClock;
use notehub::config::Config;
use notehub::models::{parse_tag_field, NoteDraft};
use notehub::query::{QueryCache, QueryKey, QueryOptions};
use notehub::render;
use notehub::shell::Shell;

#[derive(Parser)]
#[command(name = "notehub")]
#[command(about = "List, search, create and delete notes on NoteHub")]
struct Cli {
    /// API base URL (overrides NOTEHUB_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token (overrides NOTEHUB_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Notes per page
    #[arg(long, global = true)]
    per_page: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse notes interactively (default)
    Browse,
    /// Print one page of notes
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Only notes matching this text
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Create a note
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        /// One of Todo, Work, Personal, Meeting, Shopping
        #[arg(long, default_value = "Todo")]
        tag: String,
    },
    /// Delete a note by id
    Delete { id: String },
}

impl Cli {
    /// Command-line flags take precedence over every other config source.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = self.token.as_ref().filter(|t| !t.trim().is_empty()) {
            config.token = Some(token.clone());
        }
        if let Some(per_page) = self.per_page {
            config.per_page = per_page.max(1);
        }
    }
}

/// Logs go to stderr so stdout stays the note view.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notehub=warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load();
    cli.apply_overrides(&mut config);
    if config.token.is_none() {
        tracing::warn!("No NOTEHUB_TOKEN set; the API will reject requests");
    }

    let client = Arc::new(NotesClient::from_config(&config).context("Failed to build HTTP client")?);
    tracing::debug!(base_url = client.base_url(), "Using NoteHub API");

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Browse => {
            let clock = Arc::new(SystemClock);
            let cache = QueryCache::new(client.clone(), clock.clone(), QueryOptions::from(&config));
            let events = cache.subscribe();
            let app = NotesApp::new(client, cache, clock, config.debounce());

            println!("NoteHub (type `help` for commands)");
            let mut shell = Shell::new(app, events, std::io::stdout());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell.run(stdin).await?;
        }
        Commands::List { page, search } => {
            let cache = QueryCache::new(client, Arc::new(SystemClock), QueryOptions::from(&config));
            let key = QueryKey::new(page, search);
            let notes = cache.fetch(&key).await.context("Error loading notes")?;
            print!("{}", render::render_page(&notes, key.page));
        }
        Commands::Create {
            title,
            content,
            tag,
        } => {
            let draft = NoteDraft::new(title, content, parse_tag_field(&tag)?);
            draft.validate()?;

            let note = client
                .create_note(&draft)
                .await
                .context("Failed to create note")?;
            println!("Note created successfully!");
            print!("{}", render::render_note(&note));
        }
        Commands::Delete { id } => {
            let note = client
                .delete_note(&id)
                .await
                .context("Failed to delete note")?;
            println!("Note deleted successfully!");
            print!("{}", render::render_note(&note));
        }
    }

    Ok(())
}

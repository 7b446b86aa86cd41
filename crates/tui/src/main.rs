mod app;
mod error;
mod input;
mod paths;
mod prompt;
mod seed;
mod state;
mod telemetry;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chirp_blobs::ObjectBlobStore;
use chirp_card::CardSettings;
use chirp_core::config;
use chirp_core::{IdentityProvider, StaticIdentity};
use chirp_storage::open_document_store;
use clap::{Parser, Subcommand};

use crate::paths::Paths;

#[derive(Debug, Parser)]
#[command(name = "chirp-tui", version, about = "Browse, edit, and delete posts in the terminal")]
struct Cli {
    /// Configuration file; defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as this uid instead of `identity.uid`.
    #[arg(long = "as", global = true, value_name = "UID")]
    viewer: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the feed (default).
    Run,
    /// Write a post document to the store.
    Seed(seed::SeedArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("failed to load config")?;

    let paths = Paths::resolve(&config, &config::data_dir());
    telemetry::init(&config.logging.level, &paths.logs)?;

    let documents = Arc::new(
        open_document_store(&paths.database)
            .await
            .with_context(|| format!("failed to open {}", paths.database.display()))?,
    );
    let blobs = Arc::new(
        ObjectBlobStore::local(&paths.blobs, &config.blobs.public_url)
            .with_context(|| format!("failed to open {}", paths.blobs.display()))?,
    );
    let settings = CardSettings::from(&config.card);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let viewer = cli.viewer.or(config.identity.uid);
            let identity: Arc<dyn IdentityProvider> = match &viewer {
                Some(uid) => Arc::new(StaticIdentity::signed_in(uid.as_str())),
                None => Arc::new(StaticIdentity::anonymous()),
            };
            let cards = app::load_cards(documents, blobs, identity, &settings).await?;
            app::TuiApp::run(cards, viewer).await?;
        }
        Command::Seed(args) => {
            let post = seed::seed(
                args,
                config.identity.display_name.as_deref(),
                documents.as_ref(),
                blobs.as_ref(),
                &settings,
            )
            .await?;
            println!("{}", post.id);
        }
    }

    Ok(())
}

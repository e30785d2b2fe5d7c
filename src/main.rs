mod commands;
mod singleton;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use calnote_core::CalnoteConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Overrides;

#[derive(Parser)]
#[command(name = "calnote")]
#[command(about = "Append new calendar events to your daily notes as checklist items")]
struct Cli {
    /// Config file to use instead of ~/.config/calnote/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the notes folder and fill in each new daily note
    Watch {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Add new calendar events to one daily note right now
    Sync {
        /// Daily note to append to (e.g. "2024-03-15.md")
        note: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// List tasks that were already added to notes
    Tasks {
        /// Task store to read (defaults to store_path from config)
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Show config location and current settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = CalnoteConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch { overrides } => commands::watch::run(overrides.apply(config)).await,
        Commands::Sync { note, overrides } => {
            commands::sync::run(overrides.apply(config), note).await
        }
        Commands::Tasks { store } => {
            let overrides = Overrides {
                store,
                ..Overrides::default()
            };
            commands::tasks::run(overrides.apply(config))
        }
        Commands::Config => commands::config::run(cli.config.as_deref(), &config),
    }
}

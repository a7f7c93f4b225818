//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod generation;
mod health;

use anyhow::Result;
use clap::Subcommand;
use paperforge_client::PaperforgeClient;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Upload a PDF and start a generation
    Submit {
        /// Path to the PDF file
        file: PathBuf,

        /// Output type: slide_deck (presentation, ppt) or podcast
        #[arg(short = 't', long = "type")]
        output_type: String,

        /// Settings as key=value pairs (e.g., -p template=7 -p length=short)
        #[arg(short, long, value_parser = generation::parse_key_val)]
        param: Vec<(String, String)>,

        /// Wait until the generation finishes
        #[arg(short, long)]
        wait: bool,

        /// Seconds between status checks while waiting
        #[arg(long, default_value = "5")]
        interval: u64,

        /// Status checks before giving up while waiting
        #[arg(long, default_value = "180")]
        max_attempts: u32,
    },
    /// Show a generation
    Status {
        /// Generation ID or unambiguous prefix
        id: String,
    },
    /// List your generations, newest first
    List {
        /// Maximum number of generations to show (1-100)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Number of generations to skip
        #[arg(short, long)]
        offset: Option<u32>,
    },
    /// Delete a generation and its files
    Delete {
        /// Generation ID or unambiguous prefix
        id: String,
    },
    /// Check server health
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = PaperforgeClient::new(&config.server_url);

    match command {
        Commands::Submit {
            file,
            output_type,
            param,
            wait,
            interval,
            max_attempts,
        } => {
            let user_id = config.user_id()?;
            let wait = wait.then_some(paperforge_client::PollOptions {
                interval: std::time::Duration::from_secs(interval),
                max_attempts,
            });
            generation::submit(&client, user_id, &file, &output_type, param, wait).await
        }
        Commands::Status { id } => generation::status(&client, config.user_id()?, &id).await,
        Commands::List { limit, offset } => {
            generation::list(&client, config.user_id()?, limit, offset).await
        }
        Commands::Delete { id } => generation::delete(&client, config.user_id()?, &id).await,
        Commands::Health => health::check(&client).await,
    }
}

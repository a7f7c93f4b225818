//! Paperforge CLI
//!
//! Command-line interface for submitting papers to a Paperforge server and
//! tracking the generated slide decks and podcasts.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "paperforge")]
#[command(about = "Turn research papers into slide decks and podcasts", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "PAPERFORGE_URL", default_value = "http://localhost:5000")]
    server_url: String,

    /// User ID that owns submitted generations
    #[arg(long, short, env = "PAPERFORGE_USER_ID", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        user_id: cli.user,
    };

    handle_command(cli.command, &config).await
}

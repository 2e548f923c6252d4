use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;

mod cli;

use cli::collections::CollectionsCommands;
use cli::records::RecordsCommands;
use courier_cli::logging::init_tracing;
use courier_cli::{Config, DbState};

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Courier CLI - manage saved HTTP requests and their order")]
#[command(version)]
struct Cli {
    /// Database file (overrides COURIER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage collections
    #[command(subcommand)]
    Collections(CollectionsCommands),
    /// Manage records inside collections
    #[command(subcommand)]
    Records(RecordsCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    init_tracing(&config.log_filter);

    let state = DbState::init(&config.storage_config()).await?;

    match cli.command {
        Commands::Collections(cmd) => {
            cli::collections::handle_collections_command(&state, cmd).await
        }
        Commands::Records(cmd) => cli::records::handle_records_command(&state, cmd).await,
    }
}

pub mod commands;
pub mod menu;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::db::StoreGateway;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "sereno")]
#[command(about = "Sereno CLI - Administrative interface for the wellness backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Interactive administrative menu")]
    Menu,

    #[command(about = "Run one of the aggregation reports")]
    Report {
        #[command(subcommand)]
        cmd: commands::report::ReportCommands,
    },

    #[command(about = "Document store maintenance")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "Aggregate usage statistics")]
    Stats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Build the shared application state the CLI drives directly
pub async fn app_state() -> anyhow::Result<AppState> {
    let config = crate::config::config();
    let gateway = StoreGateway::connect(&config.store).await?;
    Ok(AppState::new(gateway))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Menu => {
            let state = app_state().await?;
            menu::run(&state).await
        }
        Commands::Report { cmd } => commands::report::handle(cmd, output_format).await,
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::Stats => commands::stats::handle(output_format).await,
    }
}

pub mod commands;
pub mod config;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "qube")]
#[command(about = "Qube CLI - sign in and check dashboard access for the Qube operations dashboard")]
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
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Resolve the dashboard the current session may open")]
    Dashboard {
        #[arg(help = "Role slug of the dashboard being opened (defaults to the entry point)")]
        role: Option<String>,
    },

    #[command(about = "Apply SQL migrations to the configured database")]
    Migrate {
        #[arg(default_value = "migrations", help = "Directory of .sql files")]
        dir: PathBuf,
    },
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Dashboard { role } => commands::dashboard::handle(role, output_format).await,
        Commands::Migrate { dir } => commands::migrate::handle(dir, output_format).await,
    }
}

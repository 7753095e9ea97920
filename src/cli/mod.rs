pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "orgkit")]
#[command(about = "orgkit CLI - operations tooling for the orgkit API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Print the permission catalog")]
    Permissions,

    #[command(about = "Mint a JWT for a user")]
    Token {
        #[arg(help = "User id (token subject)")]
        user_id: uuid::Uuid,
        #[arg(help = "User email")]
        email: String,
    },

    #[command(about = "Check server health status from API /health endpoint")]
    Health {
        #[arg(long, env = "ORGKIT_URL", default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
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
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Permissions => commands::permissions::handle(output_format),
        Commands::Token { user_id, email } => commands::token::handle(user_id, &email, output_format),
        Commands::Health { url } => commands::health::handle(&url, output_format).await,
    }
}

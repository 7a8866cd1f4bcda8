pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "blog")]
#[command(about = "Blog API administration: migrations, users and demo data")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply the embedded SQL migrations")]
    Migrate,

    #[command(about = "Create a user account")]
    CreateUser(commands::user::CreateUserArgs),

    #[command(about = "Activate or deactivate a user account")]
    SetActive(commands::user::SetActiveArgs),

    #[command(about = "Replace all content with randomly generated demo data")]
    Seed(commands::seed::SeedArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::CreateUser(args) => commands::user::handle(args, config, output_format).await,
        Commands::SetActive(args) => commands::user::handle_set_active(args, config, output_format).await,
        Commands::Seed(args) => commands::seed::handle(args, config, output_format).await,
    }
}

pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::AdminClient;

#[derive(Parser)]
#[command(name = "rcm-admin")]
#[command(about = "RCM admin CLI - manage users, profiles and project mappings through the admin API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "RCM_ADMIN_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the admin API"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show server information and client configuration")]
    Status,

    #[command(about = "Identity-provider user management")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UsersCommands,
    },

    #[command(about = "Tenant profile management")]
    Profiles {
        #[command(subcommand)]
        cmd: commands::profiles::ProfilesCommands,
    },

    #[command(about = "Profile-to-project mapping management")]
    Mappings {
        #[command(subcommand)]
        cmd: commands::mappings::MappingsCommands,
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
    let client = AdminClient::new(&cli.server)?;

    match cli.command {
        Commands::Status => commands::status(&client, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &client, output_format).await,
        Commands::Profiles { cmd } => commands::profiles::handle(cmd, &client, output_format).await,
        Commands::Mappings { cmd } => commands::mappings::handle(cmd, &client, output_format).await,
    }
}

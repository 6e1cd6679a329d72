use clap::Subcommand;

use crate::cli::client::{tenant_path, AdminClient};
use crate::cli::utils::{output_list, output_report, output_success};
use crate::cli::OutputFormat;

use super::confirm;

#[derive(Subcommand)]
pub enum ProfilesCommands {
    #[command(about = "List tenant profiles, newest first")]
    List {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
    },

    #[command(about = "Insert the configured demo profiles")]
    Seed {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
    },

    #[command(about = "Reset every profile password to the tenant hash")]
    ResetPasswords {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
    },

    #[command(about = "Delete profiles outside the allowed email domains")]
    Prune {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
}

pub async fn handle(cmd: ProfilesCommands, client: &AdminClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProfilesCommands::List { tenant } => {
            let profiles = client.get(&tenant_path(&tenant, "profiles")).await?;
            output_list(&output_format, &profiles, &["ehs_id", "full_name", "email", "role", "created_at"])
        }
        ProfilesCommands::Seed { tenant } => {
            let report = client.post(&tenant_path(&tenant, "profiles"), None).await?;
            output_report(&output_format, &report)
        }
        ProfilesCommands::ResetPasswords { tenant } => {
            let reset = client.put(&tenant_path(&tenant, "profiles"), None).await?;
            let message = reset["message"].as_str().unwrap_or("Passwords updated").to_string();
            output_success(&output_format, &message, Some(reset))
        }
        ProfilesCommands::Prune { tenant, yes } => {
            confirm(yes, &format!("prune profiles for tenant {}", tenant))?;
            let cleanup = client.delete(&tenant_path(&tenant, "profiles")).await?;
            let message = cleanup["message"].as_str().unwrap_or("Profiles deleted").to_string();
            output_success(&output_format, &message, Some(cleanup))
        }
    }
}

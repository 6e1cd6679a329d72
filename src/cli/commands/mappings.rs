use clap::Subcommand;

use crate::cli::client::{tenant_path, AdminClient};
use crate::cli::utils::{output_list, output_report, output_success};
use crate::cli::OutputFormat;

use super::confirm;

const RESOURCE: &str = "userprofilemapping";

#[derive(Subcommand)]
pub enum MappingsCommands {
    #[command(about = "List mappings with their profile and project")]
    List {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
    },

    #[command(about = "Map every demo user to their domain's project")]
    Seed {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
    },

    #[command(about = "Delete every mapping of the tenant")]
    Clear {
        #[arg(long, short, default_value = "pa", help = "Tenant key")]
        tenant: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
}

pub async fn handle(cmd: MappingsCommands, client: &AdminClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        MappingsCommands::List { tenant } => {
            let mappings = client.get(&tenant_path(&tenant, RESOURCE)).await?;
            output_list(
                &output_format,
                &mappings,
                &["id", "profile.email", "profile.ehs_id", "project.name", "created_at"],
            )
        }
        MappingsCommands::Seed { tenant } => {
            let report = client.post(&tenant_path(&tenant, RESOURCE), None).await?;
            output_report(&output_format, &report)
        }
        MappingsCommands::Clear { tenant, yes } => {
            confirm(yes, &format!("delete all mappings for tenant {}", tenant))?;
            let cleanup = client.delete(&tenant_path(&tenant, RESOURCE)).await?;
            let message = cleanup["message"].as_str().unwrap_or("Mappings deleted").to_string();
            output_success(&output_format, &message, Some(cleanup))
        }
    }
}

pub mod mappings;
pub mod profiles;
pub mod users;

use crate::cli::client::AdminClient;
use crate::cli::utils::output_json;
use crate::cli::OutputFormat;

pub async fn status(client: &AdminClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let info = client.get("/").await?;
    if let OutputFormat::Json = output_format {
        return output_json(&info);
    }

    println!("{} {}", info["name"].as_str().unwrap_or("?"), info["version"].as_str().unwrap_or(""));
    let clients = &info["clients"];
    println!("Anon client:         {}", yes_no(&clients["anon_configured"]));
    println!("Service role client: {}", yes_no(&clients["service_role_configured"]));
    for message in clients["messages"].as_array().into_iter().flatten() {
        println!("  ! {}", message.as_str().unwrap_or_default());
    }
    Ok(())
}

fn yes_no(flag: &serde_json::Value) -> &'static str {
    if flag.as_bool().unwrap_or(false) {
        "configured"
    } else {
        "missing"
    }
}

/// Destructive commands need an explicit `--yes`
pub(crate) fn confirm(yes: bool, what: &str) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("Refusing to {} without --yes", what);
    }
    Ok(())
}

use std::io::Read;

use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::AdminClient;
use crate::cli::utils::{output_list, output_report, output_success};
use crate::cli::OutputFormat;

const USERS_PATH: &str = "/api/rcm/users";

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "List identity-provider users, newest first")]
    List,

    #[command(about = "Create a single user")]
    Create {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, env = "RCM_USER_PASSWORD", help = "Password (at least 6 characters)")]
        password: String,
        #[arg(long, help = "Leave the email unconfirmed")]
        unconfirmed: bool,
    },

    #[command(about = "Bulk create users from a JSON file ('-' reads stdin)")]
    Import {
        #[arg(help = "File holding { \"users\": [...] } or a bare array")]
        input: String,
    },
}

pub async fn handle(cmd: UsersCommands, client: &AdminClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UsersCommands::List => {
            let users = client.get(USERS_PATH).await?;
            output_list(&output_format, &users, &["id", "email", "created_at", "last_sign_in_at"])
        }
        UsersCommands::Create {
            email,
            password,
            unconfirmed,
        } => {
            let body = json!({
                "email": email,
                "password": password,
                "email_confirmed": !unconfirmed,
            });
            let created = client.post(USERS_PATH, Some(&body)).await?;
            let id = created["user"]["id"].as_str().unwrap_or_default().to_string();
            output_success(
                &output_format,
                &format!("Created user {} ({})", email, id),
                Some(json!({ "user": created["user"] })),
            )
        }
        UsersCommands::Import { input } => {
            let body = import_body(&read_input(&input)?)?;
            let report = client.put(USERS_PATH, Some(&body)).await?;
            output_report(&output_format, &report)
        }
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
}

/// Accept either the request body itself or a bare array of users
fn import_body(text: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(text).context("Input is not valid JSON")?;
    Ok(match value {
        Value::Array(users) => json!({ "users": users }),
        other => other,
    })
}

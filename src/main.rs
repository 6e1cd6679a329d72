use anyhow::Context;

use rcm_admin_api::{config, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL and the keys
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    logging::init_subscriber(config)?;
    tracing::info!("Starting RCM Admin API in {:?} mode", config.environment);

    let state = server::AppState::from_config(config).context("failed to load seed configuration")?;
    let app = server::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("RCM Admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coffee_stand::{config, server, sheets, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SHEETS_* and SESSION_SECRET
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    config.validate().context("invalid configuration")?;
    info!("Starting coffee stand in {:?} mode", config.environment);

    let store = sheets::connect(&config.sheets).context("failed to open spreadsheet")?;
    let state = AppState::new(store, config);
    state.prepare(&config.security).await.context("failed to prepare spreadsheet")?;

    server::serve(state, config).await.context("server error")?;
    Ok(())
}

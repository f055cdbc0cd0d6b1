use anyhow::{Context, Result};
use autosales::{
    dashboard::{AppState, DashboardServer},
    fetch, Config, SalesTable,
};
use std::{env, sync::Arc};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configure ────────────────────────────────────────────────
    let config = Config::from_env().context("reading configuration")?;
    info!(source = %config.source, addr = %config.addr(), "configured");

    // ─── 3) load the dataset once; any failure here is fatal ─────────
    let client = fetch::build_client(config.fetch_timeout)?;
    let start = Instant::now();
    let text = fetch::fetch_dataset_text(&client, &config.source, config.retry)
        .await
        .with_context(|| format!("fetching dataset from {}", config.source))?;
    let table = SalesTable::from_csv_str(&text)
        .with_context(|| format!("parsing dataset from {}", config.source))?;
    info!(
        records = table.len(),
        years = table.years().len(),
        elapsed = ?start.elapsed(),
        "dataset loaded"
    );

    // ─── 4) serve ────────────────────────────────────────────────────
    let state = Arc::new(AppState::new(table));
    DashboardServer::new(state, config.addr()).start().await?;

    info!("shutdown");
    Ok(())
}

// src/main.rs
use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use datavis_server::{config, server, sim};

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for d in ["datavis_server=info", "datavis_protocol=info", "tokio=warn"] {
        if let Ok(directive) = d.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------- logging ----------
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .compact()
        .init();

    // -------- config ----------
    let cfg = config::Cli::parse_and_build_config()?;
    info!(?cfg, "DataVis simulator starting");

    // -------- socket + sim ----------
    let listener = server::bind_listener(cfg.bind)
        .with_context(|| format!("binding {}", cfg.bind))?;
    let source = sim::build_source(cfg.layout.variant(), &cfg.sim)?;
    let (tx, rx) = watch::channel(Vec::new());

    tokio::spawn(server::run_simulation(source, cfg.layout.clone(), cfg.step, tx));
    tokio::spawn(server::serve(listener, rx));

    info!(addr = %cfg.bind, layout = %cfg.layout.variant(), size = cfg.layout.size(), "serving. Press Ctrl+C to stop…");

    // -------- graceful shutdown ----------
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(?e, "failed to install Ctrl+C handler");
    }
    info!("shutdown signal received; exiting.");
    Ok(())
}

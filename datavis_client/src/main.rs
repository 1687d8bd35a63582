// src/main.rs
use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use datavis_client::{config, render, scheduler};

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for d in ["datavis_client=info", "datavis_protocol=info", "tokio=warn"] {
        if let Ok(directive) = d.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // -------- logging ----------
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // -------- config ----------
    let cfg = config::Cli::parse_and_build_config()?;
    info!(?cfg, "DataVis client starting");

    // -------- tick loop ----------
    let mut sink = render::build_sink(cfg.sink);
    scheduler::run(&cfg, sink.as_mut()).await;
    Ok(())
}

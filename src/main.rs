use std::io::BufRead;
use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt};

use quant_engine::config::AppConfig;
use quant_engine::engine::Engine;
use quant_engine::gateway::PaperGateway;
use quant_engine::indicator::engine::BuiltinIndicatorEngine;
use quant_engine::types::FeedEvent;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quant_engine=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let config_path = std::env::args().nth(1);
    let config = AppConfig::load_or_default(config_path.as_deref().map(Path::new));

    let mut engine = Engine::from_config(
        &config,
        Box::new(BuiltinIndicatorEngine::new()),
        Box::new(PaperGateway),
    )?;

    tracing::info!(
        strategies = engine.strategies().len(),
        instruments = engine.markets().len(),
        "engine ready, reading feed events from stdin"
    );

    // One JSON feed event per line, processed synchronously in arrival order.
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: FeedEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "malformed feed line, skipping");
                continue;
            }
        };
        match event {
            FeedEvent::Tick(tick) => {
                engine.on_tick(&tick);
            }
            FeedEvent::Bar { instrument, timeframe, bar } => {
                engine.on_bar(&instrument, timeframe, &bar);
            }
        }
    }

    tracing::info!("feed closed, shutting down");
    Ok(())
}

//! Settlement CLI
//!
//! Reads a JSON snapshot of participants and expenses, prints the
//! settlement plan as JSON on stdout. Logs go to stderr.
//!
//! ```text
//! settle snapshot.json
//! SETTLEMENT_CONFIG=settlement.toml settle snapshot.json
//! ```

use anyhow::Context;
use settlement::{Config, SettlementEngine, Snapshot};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: settle <snapshot.json>")?;

    // Load configuration
    let config = match std::env::var("SETTLEMENT_CONFIG") {
        Ok(config_path) => Config::from_file(&config_path)
            .with_context(|| format!("loading config from {}", config_path))?,
        Err(_) => Config::from_env().context("loading config from environment")?,
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        snapshot = %path,
        "Starting settlement run"
    );

    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let snapshot = Snapshot::from_json(&json).with_context(|| format!("parsing {}", path))?;

    let engine = SettlementEngine::new(config)?;
    let plan = match engine.settle(&snapshot.participants, &snapshot.expenses) {
        Ok(plan) => plan,
        Err(err) => {
            tracing::error!(error = %err, "Settlement failed");
            return Err(err.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

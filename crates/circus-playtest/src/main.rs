//! Circus Maximus playtest runner.
//!
//! Plays seeded bot-vs-bot games and prints a JSON balance report.

use circus_core::Ruleset;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;
mod runner;

use runner::PlaytestConfig;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PlaytestConfig::from_env()?;

    // Custom rules from a JSON file, or the standard game
    let rules = match std::env::var("CIRCUS_RULES") {
        Ok(path) => {
            info!(%path, "loading rules");
            Ruleset::from_json(&std::fs::read_to_string(&path)?)?
        }
        Err(_) => Ruleset::standard(),
    };

    let report = runner::run_all(&rules, &config)?;
    info!(
        finished = report.summary.finished,
        aborted = report.summary.aborted,
        average_rounds = report.summary.average_rounds,
        "playtest complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

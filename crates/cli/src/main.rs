//! pricewatch - scrape product pages into a Google Sheet.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod settings;

use settings::{Cli, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chromiumoxide=warn,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::try_from(Cli::parse())?;

    tokio::select! {
        outcome = app::run(settings) => match outcome {
            Ok(summary) => {
                info!(
                    ok = summary.ok_count(),
                    failed = summary.failed_count(),
                    "Scrape finished"
                );
                Ok(())
            }
            Err(e) => {
                error!("Scrape failed: {:#}", e);
                Err(e)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted, destination left unchanged");
            anyhow::bail!("interrupted")
        }
    }
}

//! `ocrdesk` -- submit images to the OCR service and watch them finish.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default                 | Description                     |
//! |----------------------------|----------|-------------------------|---------------------------------|
//! | `OCR_API_URL`              | no       | `http://localhost:8101` | Base URL of the OCR service     |
//! | `OCR_POLL_INTERVAL_MS`     | no       | `3000`                  | Milliseconds between poll ticks |
//! | `OCR_REQUEST_TIMEOUT_SECS` | no       | `30`                    | Per-request HTTP timeout        |
//! | `OCR_API_TOKEN`            | no       | --                      | Bearer token for every request  |
//! | `RUST_LOG`                 | no       | see below               | Log filter                      |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocrdesk_console::cli::Cli;
use ocrdesk_console::commands;
use ocrdesk_tracker::TrackerConfig;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "ocrdesk=info,ocrdesk_console=info,ocrdesk_tracker=info,ocrdesk_client=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the table on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = TrackerConfig::from_env()?;

    tracing::info!(
        api_url = %config.api_url,
        poll_interval = ?config.poll_interval,
        "Starting ocrdesk",
    );

    commands::run(cli.command, &config).await
}

//! pricewatch - hybrid e-commerce product scraper.
//!
//! A tool for looking up products by vendor code across several storefronts,
//! escalating from plain HTTP to a headless browser when sites fight back.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricewatch::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "pricewatch=info"
    } else {
        "pricewatch=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}

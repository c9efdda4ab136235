//! # News Enricher
//!
//! Scrapes a news site's category index page, enriches every listed article
//! from its own page, and serves the results through a short-lived cache.
//!
//! ## Usage
//!
//! ```sh
//! news_enricher serve --bind 0.0.0.0:3000
//! news_enricher fetch --category cultura --limit 3
//! ```
//!
//! ## Architecture
//!
//! A request flows through:
//! 1. **Cache**: a fresh entry for `(category, limit)` is returned immediately
//! 2. **Indexing**: fetch the index page and read one candidate per article block
//! 3. **Enrichment**: fetch every article page concurrently, each under its own timeout
//! 4. **Merge**: Open Graph fields win over index fields when present; the result is cached

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod server;
mod service;
mod utils;

use cache::TtlCache;
use cli::{Cli, Command};
use fetch::HttpFetcher;
use models::NewsRequest;
use outputs::json;
use service::NewsService;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    let config = args.site.to_config();
    debug!(domain = %config.domain, locale = %config.locale, categories = ?config.categories, "Resolved site configuration");

    let cache = TtlCache::new(config.cache_ttl);
    let service = NewsService::new(HttpFetcher::new()?, cache, config)?;

    match args.command {
        Command::Serve { bind } => {
            info!(%bind, ttl_secs = service.config().cache_ttl.as_secs(), "news_enricher starting up");
            server::serve(Arc::new(service), &bind).await?;
        }
        Command::Fetch {
            category,
            limit,
            json_output_dir,
        } => {
            // Fail before scraping if the output can't be written
            if let Some(dir) = &json_output_dir {
                if let Err(e) = ensure_writable_dir(dir).await {
                    error!(
                        path = %dir,
                        error = %e,
                        "JSON output directory is not writable (fix perms or choose a different path)"
                    );
                    return Err(e);
                }
            }

            let resolved = service.config().resolve_category(category.as_deref());
            let response = match service.get_news(NewsRequest { category, limit }).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, details = ?e.details(), "Scrape failed");
                    return Err(e.into());
                }
            };

            let rendered = serde_json::to_string_pretty(&response)?;
            debug!(preview = %truncate_for_log(&rendered, 300), "Rendered response");
            println!("{}", rendered);

            if let Some(dir) = &json_output_dir {
                json::write_response(&response, resolved.as_deref(), dir).await?;
            }

            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                count = response.result.count,
                "Execution complete"
            );
        }
    }

    Ok(())
}

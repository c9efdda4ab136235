//! Command-line interface definitions.
//!
//! Site options are global and can be provided via flags or environment
//! variables; the subcommand picks between serving the HTTP API and running a
//! single scrape.

use crate::config::SiteConfig;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Serve the API on the default address
/// news_enricher serve
///
/// # One scrape of the culture section, also written to ./json
/// news_enricher fetch --category cultura --limit 3 -j ./json
///
/// # Point at another site with a shorter cache
/// NEWS_DOMAIN=https://example.test news_enricher --cache-ttl-secs 60 serve
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub site: SiteArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the news API over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "NEWS_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
    },
    /// Scrape once and print the result as JSON
    Fetch {
        /// Section to scrape; values outside the allow-list scrape the index page
        #[arg(short, long)]
        category: Option<String>,

        /// Maximum number of articles
        #[arg(short, long)]
        limit: Option<usize>,

        /// Also write the result under this directory
        #[arg(short, long)]
        json_output_dir: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct SiteArgs {
    /// Scheme and host of the news site
    #[arg(long, global = true, env = "NEWS_DOMAIN", default_value = "https://orain.eus")]
    pub domain: String,

    /// Locale path segment article paths live under
    #[arg(long, global = true, env = "NEWS_LOCALE", default_value = "/es")]
    pub locale: String,

    /// Label put in every item's `source` field
    #[arg(long, global = true, env = "NEWS_SOURCE_LABEL", default_value = "Orain.eus")]
    pub source_label: String,

    /// Comma-separated category allow-list (replaces the built-in list)
    #[arg(long, global = true, env = "NEWS_CATEGORIES", value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Seconds a scrape result stays cached
    #[arg(long, global = true, env = "NEWS_CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Per-article detail fetch timeout in milliseconds
    #[arg(long, global = true, env = "NEWS_DETAIL_TIMEOUT_MS", default_value_t = 2500)]
    pub detail_timeout_ms: u64,

    /// Index page fetch timeout in seconds
    #[arg(long, global = true, env = "NEWS_INDEX_TIMEOUT_SECS", default_value_t = 10)]
    pub index_timeout_secs: u64,

    /// Character budget for each article's body excerpt
    #[arg(long, global = true, env = "NEWS_CONTENT_BUDGET", default_value_t = 1000)]
    pub content_budget: usize,

    /// Upper bound on the requested limit
    #[arg(long, global = true, env = "NEWS_MAX_LIMIT", default_value_t = 20)]
    pub max_limit: usize,
}

impl SiteArgs {
    /// Overlay these options on the default [`SiteConfig`].
    pub fn to_config(&self) -> SiteConfig {
        let defaults = SiteConfig::default();
        let categories = match &self.categories {
            Some(list) => list
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            None => defaults.categories.clone(),
        };
        SiteConfig {
            domain: self.domain.clone(),
            locale: self.locale.clone(),
            source_label: self.source_label.clone(),
            categories,
            max_limit: self.max_limit,
            index_timeout: Duration::from_secs(self.index_timeout_secs),
            detail_timeout: Duration::from_millis(self.detail_timeout_ms),
            content_budget: self.content_budget,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            ..defaults
        }
    }
}

//! One full scrape: index page to merged, ordered result set.

use super::SiteProfile;
use super::enricher::{DetailEnricher, MergeContext, merge};
use super::summarizer::summarize_block;
use crate::config::{DEFAULT_CATEGORY, SiteConfig};
use crate::error::NewsError;
use crate::fetch::{PageFetcher, fetch_with_deadline};
use crate::models::{ArticleCandidate, NewsItem, ResultSet};
use chrono::Utc;
use itertools::Itertools;
use scraper::Html;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Pick at most `limit` article blocks from an index page and summarize each.
///
/// # Arguments
///
/// * `html` - Raw index page body
/// * `profile` - Compiled selectors and link rules for the site
/// * `limit` - Maximum number of blocks read
///
/// Candidates are de-duplicated by resolved URL (first occurrence wins);
/// candidates without a URL pass through and are dropped at merge time.
pub fn extract_candidates(html: &str, profile: &SiteProfile, limit: usize) -> Vec<ArticleCandidate> {
    let document = Html::parse_document(html);
    profile
        .blocks
        .select_blocks(&document, limit)
        .into_iter()
        .map(|block| summarize_block(block, profile))
        .enumerate()
        .unique_by(|(i, candidate)| match &candidate.url {
            Some(url) => url.clone(),
            // unique placeholder so URL-less candidates are not collapsed
            None => format!("#{}", i),
        })
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Scrapes one index page of the configured site.
pub struct IndexScraper<'a, F> {
    fetcher: &'a F,
    config: &'a SiteConfig,
    profile: &'a SiteProfile,
}

impl<'a, F: PageFetcher> IndexScraper<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a SiteConfig, profile: &'a SiteProfile) -> Self {
        Self {
            fetcher,
            config,
            profile,
        }
    }

    /// Fetch the index for `category`, enrich up to `limit` articles and
    /// assemble the result.
    ///
    /// # Arguments
    ///
    /// * `category` - Section already validated against the allow-list, or
    ///   `None` for the locale index page
    /// * `limit` - Maximum number of article blocks to read and return
    ///
    /// # Returns
    ///
    /// The merged items in index order, with the index URL as `source`.
    /// Candidates whose link or title cannot be resolved are left out.
    ///
    /// # Errors
    ///
    /// [`NewsError::IndexFetch`] when the index page cannot be fetched. No
    /// other failure aborts the scrape.
    #[instrument(level = "info", skip(self), fields(category = category.unwrap_or("all")))]
    pub async fn scrape(&self, category: Option<&str>, limit: usize) -> Result<ResultSet, NewsError> {
        let t0 = Instant::now();
        let source = self.config.index_url(category);
        info!(%source, limit, "Fetching index page");

        let html = fetch_with_deadline(self.fetcher, &source, self.config.index_timeout)
            .await
            .map_err(|e| NewsError::IndexFetch {
                url: source.clone(),
                source: e,
            })?;

        let candidates = extract_candidates(&html, self.profile, limit);
        info!(candidates = candidates.len(), "Indexed article candidates");
        debug!(urls = ?candidates.iter().map(|c| c.url.as_deref()).collect::<Vec<_>>(), "Candidate URLs");

        let enricher = DetailEnricher::new(
            self.fetcher,
            self.profile,
            self.config.detail_timeout,
            self.config.content_budget,
        );
        let enriched = enricher.enrich(candidates).await;

        let ctx = MergeContext {
            source_label: &self.config.source_label,
            category: category.unwrap_or(DEFAULT_CATEGORY),
            scraped_at: Utc::now(),
            content_budget: self.config.content_budget,
        };
        let news: Vec<NewsItem> = enriched
            .into_iter()
            .filter_map(|(candidate, detail)| merge(candidate, detail, &ctx))
            .take(limit)
            .collect();

        info!(
            count = news.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Scrape complete"
        );
        Ok(ResultSet::new(source, news, ctx.scraped_at))
    }
}

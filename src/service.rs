//! Request handling: resolve, consult the cache, scrape on a miss.

use crate::cache::ResultCache;
use crate::config::SiteConfig;
use crate::error::NewsError;
use crate::fetch::PageFetcher;
use crate::models::{CacheKey, NewsRequest, NewsResponse};
use crate::scrapers::SiteProfile;
use crate::scrapers::index::IndexScraper;
use tracing::{info, instrument};

/// Serves news requests for one configured site.
///
/// The cache is consulted and updated around the scrape but never held
/// across it, so a slow scrape does not block other keys.
pub struct NewsService<F, C> {
    fetcher: F,
    cache: C,
    config: SiteConfig,
    profile: SiteProfile,
}

impl<F: PageFetcher, C: ResultCache> NewsService<F, C> {
    pub fn new(fetcher: F, cache: C, config: SiteConfig) -> Result<Self, NewsError> {
        let profile = SiteProfile::compile(&config)?;
        Ok(Self {
            fetcher,
            cache,
            config,
            profile,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Answer a request from cache when fresh, otherwise scrape and cache.
    ///
    /// # Arguments
    ///
    /// * `request` - Optional category and limit. Unknown categories resolve
    ///   to the index page; the limit is defaulted and clamped before it
    ///   becomes part of the cache key.
    ///
    /// # Returns
    ///
    /// The result set with `cached` set when it was served from the cache.
    ///
    /// # Errors
    ///
    /// [`NewsError::IndexFetch`] when a scrape was needed and the index page
    /// could not be fetched. Failures are never cached.
    #[instrument(level = "info", skip_all, fields(category = ?request.category, limit = ?request.limit))]
    pub async fn get_news(&self, request: NewsRequest) -> Result<NewsResponse, NewsError> {
        let category = self.config.resolve_category(request.category.as_deref());
        let limit = self.config.resolve_limit(request.limit);
        let key = CacheKey::new(category.as_deref(), limit);

        if let Some(result) = self.cache.get(&key) {
            info!(%key, count = result.count, "Serving cached result");
            return Ok(NewsResponse {
                result,
                cached: true,
            });
        }

        info!(%key, "Cache miss; scraping");
        let result = IndexScraper::new(&self.fetcher, &self.config, &self.profile)
            .scrape(category.as_deref(), limit)
            .await?;
        self.cache.set(key, result.clone());

        Ok(NewsResponse {
            result,
            cached: false,
        })
    }
}

//! Site and scraper configuration.
//!
//! [`SiteConfig`] holds everything that is specific to the scraped news site:
//! its domain and locale segment, the category allow-list, the ordered
//! selector lists used to read index and detail pages, and the timeouts and
//! budgets that bound a scrape. Defaults target Orain.eus; the CLI overrides
//! individual fields.

use std::time::Duration;

/// Browser-like user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,eu;q=0.8,en;q=0.7";

/// Category attached to items when the request resolved to the index page.
pub const DEFAULT_CATEGORY: &str = "general";

/// Fallback summary when neither the detail page nor the index block has one.
pub const SUMMARY_PLACEHOLDER: &str = "Sin resumen disponible";

/// Publish-date hint used when the index block carries no date.
pub const TODAY_SENTINEL: &str = "hoy";

/// Limit applied when a request does not specify one.
pub const DEFAULT_LIMIT: usize = 5;

/// A named CSS selector, tried in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpec {
    pub name: String,
    pub css: String,
}

impl SelectorSpec {
    pub fn new(name: &str, css: &str) -> Self {
        Self {
            name: name.to_string(),
            css: css.to_string(),
        }
    }
}

fn specs(pairs: &[(&str, &str)]) -> Vec<SelectorSpec> {
    pairs
        .iter()
        .map(|(name, css)| SelectorSpec::new(name, css))
        .collect()
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Scheme and host of the site, e.g. `https://orain.eus`.
    pub domain: String,
    /// Locale path segment every article path lives under, e.g. `/es`.
    pub locale: String,
    /// Constant `source` label on every item.
    pub source_label: String,
    /// Closed, lower-case category allow-list.
    pub categories: Vec<String>,
    pub max_limit: usize,
    pub index_timeout: Duration,
    pub detail_timeout: Duration,
    /// Character budget for `fullContent`.
    pub content_budget: usize,
    pub cache_ttl: Duration,
    /// Article block layouts, first non-empty match wins.
    pub block_selectors: Vec<SelectorSpec>,
    pub title_selectors: Vec<SelectorSpec>,
    pub summary_selectors: Vec<SelectorSpec>,
    pub image_selectors: Vec<SelectorSpec>,
    pub date_selectors: Vec<SelectorSpec>,
    /// Containers whose paragraphs make up the article body.
    pub content_selectors: Vec<SelectorSpec>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: "https://orain.eus".to_string(),
            locale: "/es".to_string(),
            source_label: "Orain.eus".to_string(),
            categories: [
                "politica", "economia", "sociedad", "cultura", "deportes", "euskadi", "nafarroa",
                "mundo",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            max_limit: 20,
            index_timeout: Duration::from_secs(10),
            detail_timeout: Duration::from_millis(2500),
            content_budget: 1000,
            cache_ttl: Duration::from_secs(300),
            block_selectors: specs(&[
                ("article", "article"),
                ("card", ".card, .news-card"),
                ("noticia", ".noticia"),
                ("news-item", ".news-item"),
            ]),
            title_selectors: specs(&[
                ("h2", "h2"),
                ("h3", "h3"),
                ("h1", "h1"),
                ("titulo", ".titulo, .title"),
            ]),
            summary_selectors: specs(&[
                ("sumario", ".sumario"),
                ("entradilla", ".entradilla"),
                ("summary", ".summary, .excerpt"),
                ("paragraph", "p"),
            ]),
            image_selectors: specs(&[("img", "img")]),
            date_selectors: specs(&[
                ("time", "time"),
                ("fecha", ".fecha, .date"),
            ]),
            content_selectors: specs(&[
                ("article-body", ".article-body"),
                ("entry-content", ".entry-content"),
                ("contenido", ".contenido-noticia, .article-content"),
                ("article", "article"),
                ("main", "main"),
            ]),
        }
    }
}

impl SiteConfig {
    /// Listing page for `category`, or the locale root when `None`.
    pub fn index_url(&self, category: Option<&str>) -> String {
        let base = format!(
            "{}/{}",
            self.domain.trim_end_matches('/'),
            self.locale.trim_matches('/')
        );
        let base = base.trim_end_matches('/').to_string();
        match category {
            Some(category) => format!("{}/{}", base, category),
            None => base,
        }
    }

    /// Resolve a requested category against the allow-list.
    ///
    /// Matching is case-insensitive; unknown values resolve to `None`, which
    /// means the index page.
    pub fn resolve_category(&self, requested: Option<&str>) -> Option<String> {
        let wanted = requested?.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.categories.iter().find(|c| **c == wanted).cloned()
    }

    /// Apply the default and clamp to `max_limit`.
    pub fn resolve_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(DEFAULT_LIMIT).min(self.max_limit)
    }
}

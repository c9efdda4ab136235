//! Concurrent detail-page enrichment.
//!
//! Every candidate that links back to the site gets its own page fetched, all
//! at once, each bounded by its own deadline. The batch completes when every
//! fetch has succeeded, failed or timed out; a slow or broken article never
//! cancels or delays its siblings beyond its own deadline. A failed fetch is a
//! per-item soft failure: it is logged and the index-derived fields stay.
//!
//! From each detail page we read Open Graph title, description and image (with
//! `meta[name=description]` as the description fallback), the
//! `article:published_time` meta, the `<title>`, and the paragraphs of the
//! first content container that has any, cut to the content budget.

use super::SiteProfile;
use crate::config::SUMMARY_PLACEHOLDER;
use crate::fetch::{PageFetcher, fetch_with_deadline};
use crate::models::{ArticleCandidate, NewsItem};
use crate::utils::{collapse_whitespace, element_text, truncate_chars};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// High-confidence fields read from an article's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<String>,
    /// `<title>` of the page, used only when no other title exists.
    pub page_title: Option<String>,
    pub body: Option<String>,
}

/// Fixed selectors for metadata every article page is expected to carry.
#[derive(Debug, Clone)]
pub struct MetaSelectors {
    og_title: Selector,
    og_description: Selector,
    og_image: Selector,
    description: Selector,
    published_time: Selector,
    title: Selector,
    paragraph: Selector,
}

impl MetaSelectors {
    pub fn new() -> Result<Self, scraper::error::SelectorErrorKind<'static>> {
        Ok(Self {
            og_title: Selector::parse(r#"meta[property="og:title"]"#)?,
            og_description: Selector::parse(r#"meta[property="og:description"]"#)?,
            og_image: Selector::parse(r#"meta[property="og:image"]"#)?,
            description: Selector::parse(r#"meta[name="description"]"#)?,
            published_time: Selector::parse(r#"meta[property="article:published_time"]"#)?,
            title: Selector::parse("title")?,
            paragraph: Selector::parse("p")?,
        })
    }
}

/// Parse a detail page. Relative `og:image` values are resolved against the
/// site domain.
pub fn parse_detail(html: &str, profile: &SiteProfile, content_budget: usize) -> DetailMetadata {
    let document = Html::parse_document(html);
    let meta = &profile.meta;
    let content = |selector: &Selector| -> Option<String> {
        document
            .select(selector)
            .filter_map(|el| el.value().attr("content"))
            .map(collapse_whitespace)
            .find(|value| !value.is_empty())
    };

    let body = profile.content.strategies().find_map(|strategy| {
        document.select(&strategy.selector).find_map(|container| {
            let paragraphs: Vec<String> = container
                .select(&meta.paragraph)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            if paragraphs.is_empty() {
                None
            } else {
                Some(truncate_chars(&paragraphs.join("\n\n"), content_budget))
            }
        })
    });

    DetailMetadata {
        title: content(&meta.og_title),
        description: content(&meta.og_description).or_else(|| content(&meta.description)),
        image: content(&meta.og_image)
            .and_then(|src| profile.links.resolve_asset(Some(src.as_str()))),
        published_at: content(&meta.published_time),
        page_title: document
            .select(&meta.title)
            .map(element_text)
            .find(|t| !t.is_empty()),
        body,
    }
}

/// Values shared by every item of one scrape.
#[derive(Debug, Clone)]
pub struct MergeContext<'a> {
    pub source_label: &'a str,
    pub category: &'a str,
    pub scraped_at: DateTime<Utc>,
    pub content_budget: usize,
}

/// Merge a candidate with whatever its detail page yielded.
///
/// Detail fields win only when present. Returns `None` when the candidate has
/// no URL or no title could be resolved from any source.
pub fn merge(
    candidate: ArticleCandidate,
    detail: Option<DetailMetadata>,
    ctx: &MergeContext<'_>,
) -> Option<NewsItem> {
    let url = candidate.url.filter(|u| !u.is_empty())?;
    let detail = detail.unwrap_or_default();

    let title = detail
        .title
        .or(candidate.title_fallback)
        .or(detail.page_title)?;

    let summary = detail
        .description
        .or(Some(candidate.summary_fallback).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| SUMMARY_PLACEHOLDER.to_string());

    let full_content = detail
        .body
        .unwrap_or_else(|| truncate_chars(&summary, ctx.content_budget));

    Some(NewsItem {
        title,
        summary,
        full_content,
        url,
        image: detail.image.or(candidate.image_fallback),
        source: ctx.source_label.to_string(),
        category: ctx.category.to_string(),
        scraped_at: ctx.scraped_at,
        published_at: detail.published_at.unwrap_or(candidate.date_hint),
    })
}

/// Fetches and parses the detail pages of one batch of candidates.
pub struct DetailEnricher<'a, F> {
    fetcher: &'a F,
    profile: &'a SiteProfile,
    timeout: Duration,
    content_budget: usize,
}

impl<'a, F: PageFetcher> DetailEnricher<'a, F> {
    pub fn new(
        fetcher: &'a F,
        profile: &'a SiteProfile,
        timeout: Duration,
        content_budget: usize,
    ) -> Self {
        Self {
            fetcher,
            profile,
            timeout,
            content_budget,
        }
    }

    /// Enrich every candidate concurrently.
    ///
    /// Each same-site candidate gets one detail fetch bounded by the
    /// enricher's timeout. The call returns once every fetch has finished,
    /// failed or timed out.
    ///
    /// # Arguments
    ///
    /// * `candidates` - Provisional articles read from the index page
    ///
    /// # Returns
    ///
    /// Each candidate in input order, paired with its detail metadata. The
    /// metadata is `None` when the candidate was off-site or had no URL, and
    /// also when its fetch failed.
    #[instrument(level = "info", skip_all, fields(candidates = candidates.len()))]
    pub async fn enrich(
        &self,
        candidates: Vec<ArticleCandidate>,
    ) -> Vec<(ArticleCandidate, Option<DetailMetadata>)> {
        let t0 = Instant::now();
        let enriched = join_all(
            candidates
                .into_iter()
                .map(|candidate| self.enrich_one(candidate)),
        )
        .await;

        let hits = enriched.iter().filter(|(_, d)| d.is_some()).count();
        info!(
            enriched = hits,
            total = enriched.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Detail enrichment complete"
        );
        enriched
    }

    async fn enrich_one(
        &self,
        candidate: ArticleCandidate,
    ) -> (ArticleCandidate, Option<DetailMetadata>) {
        let detail = match candidate.url.as_deref() {
            Some(url) if self.profile.links.is_same_site(url) => self.fetch_detail(url).await,
            Some(url) => {
                debug!(%url, "Off-site link; skipping detail enrichment");
                None
            }
            None => None,
        };
        (candidate, detail)
    }

    async fn fetch_detail(&self, url: &str) -> Option<DetailMetadata> {
        match fetch_with_deadline(self.fetcher, url, self.timeout).await {
            Ok(html) => {
                let detail = parse_detail(&html, self.profile, self.content_budget);
                debug!(
                    %url,
                    og_title = detail.title.is_some(),
                    og_image = detail.image.is_some(),
                    body_chars = detail.body.as_ref().map(|b| b.chars().count()).unwrap_or(0),
                    "Parsed detail page"
                );
                Some(detail)
            }
            Err(e) => {
                warn!(%url, error = %e, "Detail fetch failed; keeping index fields");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteConfig, TODAY_SENTINEL};
    use crate::fetch::testing::StubFetcher;

    fn profile() -> SiteProfile {
        let config = SiteConfig {
            domain: "https://example.test".to_string(),
            ..SiteConfig::default()
        };
        SiteProfile::compile(&config).unwrap()
    }

    fn candidate(url: &str) -> ArticleCandidate {
        ArticleCandidate {
            url: Some(url.to_string()),
            title_fallback: Some("Titular del índice".to_string()),
            summary_fallback: "Entradilla del índice".to_string(),
            image_fallback: Some("https://example.test/index.jpg".to_string()),
            date_hint: TODAY_SENTINEL.to_string(),
        }
    }

    fn ctx() -> MergeContext<'static> {
        MergeContext {
            source_label: "Orain.eus",
            category: "general",
            scraped_at: Utc::now(),
            content_budget: 1000,
        }
    }

    const DETAIL: &str = r#"<html><head>
        <title>Página | Orain</title>
        <meta property="og:title" content="Titular OG">
        <meta property="og:description" content="Descripción OG">
        <meta property="og:image" content="/media/og.jpg">
        <meta property="article:published_time" content="2025-05-06T07:30:00+02:00">
        </head><body>
        <div class="article-body"><p>Primer párrafo.</p><p>  Segundo
        párrafo. </p></div>
        </body></html>"#;

    #[test]
    fn test_parse_detail_reads_open_graph_and_body() {
        let detail = parse_detail(DETAIL, &profile(), 1000);
        assert_eq!(detail.title.as_deref(), Some("Titular OG"));
        assert_eq!(detail.description.as_deref(), Some("Descripción OG"));
        assert_eq!(detail.image.as_deref(), Some("https://example.test/media/og.jpg"));
        assert_eq!(detail.published_at.as_deref(), Some("2025-05-06T07:30:00+02:00"));
        assert_eq!(detail.page_title.as_deref(), Some("Página | Orain"));
        assert_eq!(
            detail.body.as_deref(),
            Some("Primer párrafo.\n\nSegundo párrafo.")
        );
    }

    #[test]
    fn test_parse_detail_description_fallback() {
        let html = r#"<head><meta name="description" content="Meta genérica"></head>"#;
        let detail = parse_detail(html, &profile(), 1000);
        assert_eq!(detail.description.as_deref(), Some("Meta genérica"));
        assert_eq!(detail.title, None);
        assert_eq!(detail.body, None);
    }

    #[test]
    fn test_parse_detail_body_respects_budget() {
        let paragraph = format!("<p>{}</p>", "palabra ".repeat(100));
        let html = format!(r#"<div class="entry-content">{}</div>"#, paragraph.repeat(5));
        let detail = parse_detail(&html, &profile(), 1000);
        let body = detail.body.unwrap();
        assert!(body.chars().count() <= 1000);
        assert!(body.starts_with("palabra palabra"));
    }

    #[test]
    fn test_parse_detail_line_breaks_separate_words() {
        let html = r#"<div class="article-body"><p>Primera línea<br>Segunda línea</p></div>"#;
        let detail = parse_detail(html, &profile(), 1000);
        assert_eq!(detail.body.as_deref(), Some("Primera línea Segunda línea"));
    }

    #[test]
    fn test_parse_detail_skips_empty_containers() {
        let html = r#"<div class="article-body"></div><main><p>Cuerpo en main</p></main>"#;
        let detail = parse_detail(html, &profile(), 1000);
        assert_eq!(detail.body.as_deref(), Some("Cuerpo en main"));
    }

    #[test]
    fn test_merge_prefers_detail_fields() {
        let detail = parse_detail(DETAIL, &profile(), 1000);
        let item = merge(candidate("https://example.test/es/n/1"), Some(detail), &ctx()).unwrap();
        assert_eq!(item.title, "Titular OG");
        assert_eq!(item.summary, "Descripción OG");
        assert_eq!(item.image.as_deref(), Some("https://example.test/media/og.jpg"));
        assert_eq!(item.published_at, "2025-05-06T07:30:00+02:00");
        assert_eq!(item.full_content, "Primer párrafo.\n\nSegundo párrafo.");
    }

    #[test]
    fn test_merge_without_detail_keeps_fallbacks() {
        let item = merge(candidate("https://example.test/es/n/1"), None, &ctx()).unwrap();
        assert_eq!(item.title, "Titular del índice");
        assert_eq!(item.summary, "Entradilla del índice");
        assert_eq!(item.full_content, "Entradilla del índice");
        assert_eq!(item.image.as_deref(), Some("https://example.test/index.jpg"));
        assert_eq!(item.published_at, TODAY_SENTINEL);
        assert_eq!(item.source, "Orain.eus");
        assert_eq!(item.category, "general");
    }

    #[test]
    fn test_merge_drops_items_without_url_or_title() {
        let mut no_url = candidate("https://example.test/es/n/1");
        no_url.url = None;
        assert!(merge(no_url, None, &ctx()).is_none());

        let mut no_title = candidate("https://example.test/es/n/1");
        no_title.title_fallback = None;
        assert!(merge(no_title.clone(), None, &ctx()).is_none());

        let detail = DetailMetadata {
            page_title: Some("Desde <title>".to_string()),
            ..DetailMetadata::default()
        };
        let item = merge(no_title, Some(detail), &ctx()).unwrap();
        assert_eq!(item.title, "Desde <title>");
    }

    #[test]
    fn test_merge_summary_placeholder() {
        let mut bare = candidate("https://example.test/es/n/1");
        bare.summary_fallback = String::new();
        let item = merge(bare, None, &ctx()).unwrap();
        assert_eq!(item.summary, SUMMARY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_enrich_skips_off_site_links() {
        let fetcher = StubFetcher::new().page("https://other.test/n/1", DETAIL);
        let profile = profile();
        let enricher = DetailEnricher::new(&fetcher, &profile, Duration::from_secs(1), 1000);
        let out = enricher.enrich(vec![candidate("https://other.test/n/1")]).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].1.is_none());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_enrich_failed_fetch_is_soft() {
        let fetcher = StubFetcher::new()
            .page("https://example.test/es/n/1", DETAIL)
            .failing_page("https://example.test/es/n/2", 500);
        let profile = profile();
        let enricher = DetailEnricher::new(&fetcher, &profile, Duration::from_secs(1), 1000);
        let out = enricher
            .enrich(vec![
                candidate("https://example.test/es/n/1"),
                candidate("https://example.test/es/n/2"),
            ])
            .await;
        assert_eq!(out.len(), 2);
        assert!(out[0].1.is_some());
        assert!(out[1].1.is_none());
        assert_eq!(out[1].0.url.as_deref(), Some("https://example.test/es/n/2"));
    }

    #[tokio::test]
    async fn test_one_hanging_article_does_not_hold_the_batch() {
        let mut fetcher = StubFetcher::new().slow_page(
            "https://example.test/es/n/0",
            DETAIL,
            Duration::from_secs(30),
        );
        for i in 1..5 {
            fetcher = fetcher.slow_page(
                &format!("https://example.test/es/n/{}", i),
                DETAIL,
                Duration::from_millis(100),
            );
        }
        let profile = profile();
        let enricher = DetailEnricher::new(&fetcher, &profile, Duration::from_millis(400), 1000);
        let candidates = (0..5)
            .map(|i| candidate(&format!("https://example.test/es/n/{}", i)))
            .collect();

        let t0 = Instant::now();
        let out = enricher.enrich(candidates).await;
        let elapsed = t0.elapsed();

        // Concurrent: bounded by the single timeout, not 4 x 100ms + 30s.
        assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
        assert_eq!(out.len(), 5);
        assert!(out[0].1.is_none());
        assert!(out[1..].iter().all(|(_, d)| d.is_some()));
        let order: Vec<_> = out.iter().map(|(c, _)| c.url.clone().unwrap()).collect();
        assert_eq!(order[0], "https://example.test/es/n/0");
        assert_eq!(order[4], "https://example.test/es/n/4");
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let mut fetcher = StubFetcher::new();
        for i in 0..5 {
            fetcher = fetcher.slow_page(
                &format!("https://example.test/es/n/{}", i),
                DETAIL,
                Duration::from_millis(300),
            );
        }
        let profile = profile();
        let enricher = DetailEnricher::new(&fetcher, &profile, Duration::from_secs(2), 1000);
        let candidates = (0..5)
            .map(|i| candidate(&format!("https://example.test/es/n/{}", i)))
            .collect();

        let t0 = Instant::now();
        let out = enricher.enrich(candidates).await;
        assert!(t0.elapsed() < Duration::from_millis(1200), "took {:?}", t0.elapsed());
        assert!(out.iter().all(|(_, d)| d.is_some()));
        assert_eq!(fetcher.calls(), 5);
    }
}

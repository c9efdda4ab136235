//! Index scraping and detail enrichment.
//!
//! A scrape runs in two phases, like every news source scraper:
//!
//! 1. **Indexing**: fetch the category index page, pick the article blocks
//!    with the first matching [`selectors::SelectorChain`] strategy, and read
//!    a provisional [`ArticleCandidate`](crate::models::ArticleCandidate) out
//!    of each block ([`summarizer`]), with its link resolved by
//!    [`links::LinkNormalizer`].
//! 2. **Fetching**: fetch every candidate's own page concurrently and merge
//!    the Open Graph metadata and body excerpt over the provisional fields
//!    ([`enricher`]).
//!
//! | Stage | Module | Failure handling |
//! |-------|--------|------------------|
//! | Index fetch | [`index`] | fatal for the request |
//! | Block selection | [`selectors`] | zero matches is an empty result |
//! | Link resolution | [`links`] | unresolvable link drops that candidate |
//! | Block summary | [`summarizer`] | missing fields use sentinels |
//! | Detail fetch | [`enricher`] | logged, index fields kept |

pub mod enricher;
pub mod index;
pub mod links;
pub mod selectors;
pub mod summarizer;

use crate::config::SiteConfig;
use crate::error::NewsError;
use enricher::MetaSelectors;
use links::LinkNormalizer;
use scraper::Selector;
use selectors::SelectorChain;

/// A [`SiteConfig`]'s selector lists and link rules, compiled once.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub links: LinkNormalizer,
    pub blocks: SelectorChain,
    pub title: SelectorChain,
    pub summary: SelectorChain,
    pub image: SelectorChain,
    pub date: SelectorChain,
    pub content: SelectorChain,
    pub anchor: Selector,
    pub meta: MetaSelectors,
}

impl SiteProfile {
    pub fn compile(config: &SiteConfig) -> Result<Self, NewsError> {
        let links = LinkNormalizer::new(&config.domain, &config.locale).ok_or_else(|| {
            NewsError::InvalidConfig(format!("domain {:?} is not an http(s) URL", config.domain))
        })?;
        Ok(Self {
            links,
            blocks: SelectorChain::compile(&config.block_selectors)?,
            title: SelectorChain::compile(&config.title_selectors)?,
            summary: SelectorChain::compile(&config.summary_selectors)?,
            image: SelectorChain::compile(&config.image_selectors)?,
            date: SelectorChain::compile(&config.date_selectors)?,
            content: SelectorChain::compile(&config.content_selectors)?,
            anchor: Selector::parse("a[href]").map_err(builtin)?,
            meta: MetaSelectors::new().map_err(builtin)?,
        })
    }
}

fn builtin(e: scraper::error::SelectorErrorKind<'_>) -> NewsError {
    NewsError::InvalidConfig(format!("built-in selector failed to parse: {}", e))
}

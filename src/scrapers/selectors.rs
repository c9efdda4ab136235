//! Named CSS selector lists evaluated first-match-wins.
//!
//! Site layout heuristics live in [`SiteConfig`](crate::config::SiteConfig) as
//! ordered `(name, css)` data. They are compiled once into a [`SelectorChain`]
//! and tried in order; the first one that matches anything is used on its own.
//! Results from different selectors are never merged.

use crate::config::SelectorSpec;
use crate::error::NewsError;
use crate::utils::element_text;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct NamedSelector {
    pub name: String,
    pub selector: Selector,
}

/// Ordered selector strategies.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    strategies: Vec<NamedSelector>,
}

impl SelectorChain {
    /// Compile every selector, failing on the first invalid CSS expression.
    pub fn compile(specs: &[SelectorSpec]) -> Result<Self, NewsError> {
        let strategies = specs
            .iter()
            .map(|spec| {
                Selector::parse(&spec.css)
                    .map(|selector| NamedSelector {
                        name: spec.name.clone(),
                        selector,
                    })
                    .map_err(|_| NewsError::InvalidSelector {
                        name: spec.name.clone(),
                        css: spec.css.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { strategies })
    }

    /// Elements of the first strategy that matches anything in `document`,
    /// truncated to `limit`. Empty when no strategy matches.
    pub fn select_blocks<'a>(&self, document: &'a Html, limit: usize) -> Vec<ElementRef<'a>> {
        for strategy in &self.strategies {
            let matched: Vec<ElementRef<'a>> = document.select(&strategy.selector).collect();
            if !matched.is_empty() {
                debug!(
                    strategy = %strategy.name,
                    matched = matched.len(),
                    limit,
                    "Selector strategy matched"
                );
                return matched.into_iter().take(limit).collect();
            }
        }
        debug!(strategies = self.strategies.len(), "No selector strategy matched");
        Vec::new()
    }

    /// First element under `scope` matched by the earliest strategy that
    /// matches at all.
    pub fn first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.strategies
            .iter()
            .find_map(|strategy| scope.select(&strategy.selector).next())
    }

    /// Collapsed text of the first element, across strategies, whose text is
    /// non-empty.
    pub fn first_text_in(&self, scope: ElementRef<'_>) -> Option<String> {
        self.strategies.iter().find_map(|strategy| {
            scope
                .select(&strategy.selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    /// Strategies in evaluation order.
    pub fn strategies(&self) -> impl Iterator<Item = &NamedSelector> {
        self.strategies.iter()
    }
}

//! Low-confidence extraction from a single index-page block.
//!
//! Everything read here is provisional. The detail enricher replaces any
//! field it can read from the article's own page.

use super::SiteProfile;
use crate::config::TODAY_SENTINEL;
use crate::models::ArticleCandidate;
use crate::utils::{collapse_whitespace, element_text};
use scraper::{ElementRef, Selector};

/// Image source attributes in preference order; lazy loaders keep the real
/// URL in a `data-*` attribute and a placeholder in `src`.
const IMAGE_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "src"];

/// Read link, title, teaser, image and date hint out of one index block.
pub fn summarize_block(block: ElementRef<'_>, profile: &SiteProfile) -> ArticleCandidate {
    let anchor = first_anchor(block, &profile.anchor);
    let href = anchor.and_then(|a| a.value().attr("href"));

    let title_fallback = profile
        .title
        .first_text_in(block)
        .or_else(|| {
            anchor
                .and_then(|a| a.value().attr("title"))
                .map(collapse_whitespace)
                .filter(|t| !t.is_empty())
        });

    let summary_fallback = profile.summary.first_text_in(block).unwrap_or_default();

    let image_fallback = profile
        .image
        .first_in(block)
        .and_then(image_source)
        .and_then(|src| profile.links.resolve_asset(Some(src)));

    let date_hint = profile
        .date
        .first_in(block)
        .and_then(|el| {
            el.value()
                .attr("datetime")
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .or_else(|| Some(element_text(el)))
        })
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| TODAY_SENTINEL.to_string());

    ArticleCandidate {
        url: profile.links.normalize(href),
        title_fallback,
        summary_fallback,
        image_fallback,
        date_hint,
    }
}

/// The block itself when it is a link card, otherwise its first `a[href]`.
fn first_anchor<'a>(block: ElementRef<'a>, anchor: &Selector) -> Option<ElementRef<'a>> {
    if block.value().name() == "a" && block.value().attr("href").is_some() {
        return Some(block);
    }
    block.select(anchor).next()
}

fn image_source<'a>(img: ElementRef<'a>) -> Option<&'a str> {
    let attrs = img.value();
    IMAGE_ATTRS
        .iter()
        .filter_map(|name| attrs.attr(name))
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))
        .or_else(|| {
            attrs
                .attr("srcset")
                .and_then(|set| set.split(',').next())
                .and_then(|first| first.split_whitespace().next())
        })
}

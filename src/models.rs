//! Data models for scraped news items and their cached result sets.
//!
//! This module defines the structures that flow through a scrape:
//! - [`ArticleCandidate`]: provisional data read from one index-page block
//! - [`NewsItem`]: the merged article returned to callers
//! - [`ResultSet`]: the ordered payload that is cached and served
//! - [`NewsRequest`] / [`NewsResponse`]: the request and response shapes
//! - [`CacheKey`]: the deterministic key a result set is cached under
//!
//! Serialized field names use camelCase to match the JSON consumed by the
//! agent tool layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisional article data extracted from a single index block.
///
/// Every field is low-confidence: the detail enricher overwrites whatever it
/// can read from the article's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleCandidate {
    /// Absolute article URL, `None` when the block's link could not be resolved.
    pub url: Option<String>,
    /// Heading text, `None` is the unresolved-title sentinel.
    pub title_fallback: Option<String>,
    pub summary_fallback: String,
    pub image_fallback: Option<String>,
    /// Human-readable date hint, or the "today" sentinel.
    pub date_hint: String,
}

/// A single article as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub full_content: String,
    pub url: String,
    pub image: Option<String>,
    pub source: String,
    pub category: String,
    pub scraped_at: DateTime<Utc>,
    pub published_at: String,
}

/// The ordered payload of one scrape.
///
/// Once handed to the cache a result set is only ever cloned out, so readers
/// never observe each other's changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub success: bool,
    pub news: Vec<NewsItem>,
    pub count: usize,
    /// Index URL the items were scraped from.
    pub source: String,
    pub scraped_at: DateTime<Utc>,
}

impl ResultSet {
    pub fn new(source: String, news: Vec<NewsItem>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            count: news.len(),
            news,
            source,
            scraped_at,
        }
    }
}

/// Body of a news request.
///
/// Both fields are optional; a negative or non-numeric `limit` fails to
/// deserialize and is rejected as a malformed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsRequest {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// A successful response: the result set plus whether it came from cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsResponse {
    #[serde(flatten)]
    pub result: ResultSet,
    pub cached: bool,
}

/// A failed response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
        }
    }
}

/// Cache key for a resolved `(category, limit)` pair.
///
/// Serialized as `news:<category-or-all>:<limit>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(category: Option<&str>, limit: usize) -> Self {
        CacheKey(format!("news:{}:{}", category.unwrap_or("all"), limit))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Outbound page fetching.
//!
//! The scraper only needs one capability from the network: "give me the body
//! of this URL within this deadline". [`PageFetcher`] captures that, so the
//! index scrape and the detail enricher can run against a real HTTP client in
//! production and against in-memory doubles in tests.

use crate::config::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use crate::error::FetchError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Fetch the body of a page.
///
/// `timeout` is the deadline for this one call. Implementations should honor
/// it, and callers go through [`fetch_with_deadline`] which enforces it
/// regardless.
pub trait PageFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Run a fetch bounded by `timeout`.
///
/// The deadline is passed down to the fetcher and also applied around it, so
/// a fetcher that ignores the parameter still cannot overrun.
pub async fn fetch_with_deadline<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    match tokio::time::timeout(timeout, fetcher.fetch(url, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    }
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
///
/// Every request carries browser-like `User-Agent`, `Accept` and
/// `Accept-Language` headers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self), fields(%url))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| classify(e, timeout))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

fn classify(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Http(e)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;

    #[tokio::test]
    async fn test_deadline_cuts_off_slow_fetch() {
        let fetcher = StubFetcher::new().slow_page(
            "https://example.test/slow",
            "<html></html>",
            Duration::from_secs(5),
        );
        let t0 = Instant::now();
        let result =
            fetch_with_deadline(&fetcher, "https://example.test/slow", Duration::from_millis(50))
                .await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
        assert!(t0.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_http_fetcher_sends_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/es")
            .match_header("user-agent", USER_AGENT)
            .match_header("accept-language", ACCEPT_LANGUAGE)
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher
            .fetch(&format!("{}/es", server.url()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/es")
            .with_status(503)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher
            .fetch(&format!("{}/es", server.url()), Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_invalid_url() {
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch("not a url", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}

//! HTTP API server.
//!
//! Routes:
//!
//! | Method | Path | Body / query |
//! |--------|------|--------------|
//! | `POST` | `/api/tools/get-news` | `{ "category"?: string, "limit"?: number }` |
//! | `GET`  | `/api/tools/get-news` | `?category=..&limit=..` |
//! | `GET`  | `/health` | |
//!
//! The GET form builds the same [`NewsRequest`] as the POST body. Malformed
//! input is answered with `400` before any network work; an index page that
//! cannot be fetched with `502`.

use crate::cache::ResultCache;
use crate::error::NewsError;
use crate::fetch::PageFetcher;
use crate::models::{ErrorResponse, NewsRequest};
use crate::service::NewsService;
use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

pub const NEWS_PATH: &str = "/api/tools/get-news";

#[derive(Debug, Serialize)]
struct HealthResponse {
    healthy: bool,
    version: &'static str,
}

pub fn router<F, C>(service: Arc<NewsService<F, C>>) -> Router
where
    F: PageFetcher + 'static,
    C: ResultCache + 'static,
{
    Router::new()
        .route(NEWS_PATH, get(get_news::<F, C>).post(post_news::<F, C>))
        .route("/health", get(health))
        .with_state(service)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn post_news<F, C>(
    State(service): State<Arc<NewsService<F, C>>>,
    payload: Result<Json<NewsRequest>, JsonRejection>,
) -> Response
where
    F: PageFetcher + 'static,
    C: ResultCache + 'static,
{
    match payload {
        Ok(Json(request)) => respond(&service, request).await,
        Err(rejection) => malformed(rejection.body_text()),
    }
}

async fn get_news<F, C>(
    State(service): State<Arc<NewsService<F, C>>>,
    query: Result<Query<NewsRequest>, QueryRejection>,
) -> Response
where
    F: PageFetcher + 'static,
    C: ResultCache + 'static,
{
    match query {
        Ok(Query(request)) => respond(&service, request).await,
        Err(rejection) => malformed(rejection.body_text()),
    }
}

async fn respond<F, C>(service: &NewsService<F, C>, request: NewsRequest) -> Response
where
    F: PageFetcher,
    C: ResultCache,
{
    match service.get_news(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
            };
            error!(error = %e, details = ?e.details(), %status, "News request failed");
            error_response(status, &e)
        }
    }
}

fn malformed(details: String) -> Response {
    warn!(%details, "Rejected malformed news request");
    error_response(
        StatusCode::BAD_REQUEST,
        &NewsError::InvalidRequest(details),
    )
}

fn error_response(status: StatusCode, e: &NewsError) -> Response {
    (status, Json(ErrorResponse::new(e.to_string(), e.details()))).into_response()
}

/// Interval between cache sweeps: the TTL clamped to one second .. one day.
/// Longer periods overflow the ticker's next deadline.
fn sweep_period(ttl: Duration) -> Duration {
    ttl.clamp(Duration::from_secs(1), Duration::from_secs(24 * 60 * 60))
}

/// Bind `addr` and serve until Ctrl-C.
///
/// Also runs a sweep of expired cache entries once per TTL period.
pub async fn serve<F, C>(service: Arc<NewsService<F, C>>, addr: &str) -> Result<(), Box<dyn Error>>
where
    F: PageFetcher + 'static,
    C: ResultCache + 'static,
{
    let addr: SocketAddr = addr.parse()?;

    let period = sweep_period(service.cache().ttl());
    let sweeper = Arc::clone(&service);
    let sweep = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if sweeper.cache().is_empty() {
                continue;
            }
            let purged = sweeper.cache().purge_expired();
            if purged > 0 {
                debug!(
                    purged,
                    remaining = sweeper.cache().len(),
                    "Swept expired cache entries"
                );
            }
        }
    });

    let app = router(service).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, path = NEWS_PATH, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down");
        })
        .await?;

    sweep.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::config::SiteConfig;
    use crate::fetch::testing::StubFetcher;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    const INDEX: &str = r#"<html><body>
        <article><a href="/es/n/1"><h2>Uno</h2></a><p>Resumen uno</p></article>
        <article><a href="/es/n/2"><h2>Dos</h2></a><p>Resumen dos</p></article>
        <article><a href="/es/n/3"><h2>Tres</h2></a><p>Resumen tres</p></article>
        </body></html>"#;

    fn app(fetcher: StubFetcher) -> Router {
        let config = SiteConfig {
            domain: "https://example.test".to_string(),
            ..SiteConfig::default()
        };
        let service =
            NewsService::new(fetcher, TtlCache::new(Duration::from_secs(60)), config).unwrap();
        router(Arc::new(service))
    }

    fn working_app() -> Router {
        app(StubFetcher::new()
            .page("https://example.test/es", INDEX)
            .page("https://example.test/es/mundo", INDEX))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(NEWS_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_returns_news() {
        let response = working_app().oneshot(post(r#"{"limit": 2}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 2);
        assert_eq!(json["news"].as_array().unwrap().len(), 2);
        assert_eq!(json["news"][0]["title"], "Uno");
        assert_eq!(json["source"], "https://example.test/es");
        assert_eq!(json["cached"], false);
        assert!(json["scrapedAt"].is_string());
    }

    #[tokio::test]
    async fn test_get_with_category_matches_post() {
        let app = working_app();
        let get = Request::builder()
            .uri(format!("{}?category=mundo", NEWS_PATH))
            .body(Body::empty())
            .unwrap();
        let first = body_json(app.clone().oneshot(get).await.unwrap()).await;
        assert_eq!(first["source"], "https://example.test/es/mundo");
        assert_eq!(first["news"][0]["category"], "mundo");

        // same (category, limit) through POST hits the cache entry GET filled
        let second = body_json(
            app.oneshot(post(r#"{"category": "Mundo", "limit": 5}"#))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(second["cached"], true);
        assert_eq!(first["news"], second["news"]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let response = working_app().oneshot(post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().starts_with("invalid request"));
        assert!(json["details"].is_string());
    }

    #[tokio::test]
    async fn test_negative_limit_is_rejected_without_fetching() {
        let response = working_app().oneshot(post(r#"{"limit": -3}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let get = Request::builder()
            .uri(format!("{}?limit=abc", NEWS_PATH))
            .body(Body::empty())
            .unwrap();
        let response = working_app().oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_index_failure_is_bad_gateway() {
        let app = app(StubFetcher::new().failing_page("https://example.test/es", 500));
        let response = app.oneshot(post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "failed to fetch index page https://example.test/es");
        assert_eq!(json["details"], "unexpected status 500 from https://example.test/es");
    }

    #[tokio::test]
    async fn test_empty_index_is_success() {
        let app = app(StubFetcher::new().page("https://example.test/es", "<html><body></body></html>"));
        let response = app.oneshot(post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["news"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_sweep_period_is_bounded() {
        assert_eq!(sweep_period(Duration::ZERO), Duration::from_secs(1));
        assert_eq!(sweep_period(Duration::from_secs(300)), Duration::from_secs(300));
        assert_eq!(
            sweep_period(Duration::from_secs(u64::MAX)),
            Duration::from_secs(86_400)
        );
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = working_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["healthy"], true);
    }
}

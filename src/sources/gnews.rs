// src/sources/gnews.rs
//! News source backed by the GNews search API.

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::error::SourceError;
use crate::report::SourceKind;
use crate::sources::types::{NewsArticle, SourceItem, SourceProvider};

pub const GNEWS_SEARCH_URL: &str = "https://gnews.io/api/v4/search";
pub const DEFAULT_NEWS_QUERY: &str = "disaster OR flood OR earthquake OR fire OR hurricane";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

pub struct GNewsSource {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    query: String,
    lang: String,
    timeout: Duration,
}

impl GNewsSource {
    pub fn new(api_key: String, query: String, lang: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("sireneye/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: GNEWS_SEARCH_URL.to_string(),
            api_key,
            query,
            lang,
            timeout,
        })
    }

    /// Point the client at a different endpoint (local stand-ins, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn fetch_err(&self, message: impl Into<String>) -> SourceError {
        SourceError::Fetch {
            source_name: self.name(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl SourceProvider for GNewsSource {
    async fn fetch_items(&self) -> Result<Vec<SourceItem>, SourceError> {
        if self.api_key.is_empty() {
            return Err(self.fetch_err("missing NEWS_API_KEY"));
        }
        let t0 = std::time::Instant::now();

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", self.query.as_str()),
                ("lang", self.lang.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout {
                        source_name: self.name(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    self.fetch_err(e.without_url().to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(self.fetch_err(format!("HTTP {}", resp.status())));
        }

        let body: SearchResponse = resp.json().await.map_err(|e| SourceError::Payload {
            source_name: self.name(),
            message: e.without_url().to_string(),
        })?;

        histogram!("source_fetch_ms", "source" => self.name())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("source_items_total", "source" => self.name())
            .increment(body.articles.len() as u64);

        Ok(body.articles.into_iter().map(SourceItem::News).collect())
    }

    fn name(&self) -> &'static str {
        "gnews"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::News
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_tolerates_extra_and_missing_fields() {
        let json = r#"{
            "totalArticles": 2,
            "articles": [
                {"title": "Flood", "description": "Area submerged", "url": "https://n.test/1", "image": null},
                {"title": "Quake"}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.articles.len(), 2);
        assert_eq!(parsed.articles[1].description, None);
    }

    #[tokio::test]
    async fn missing_key_is_a_fetch_error() {
        let src = GNewsSource::new(
            String::new(),
            DEFAULT_NEWS_QUERY.into(),
            "en".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = src.fetch_items().await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }));
    }

    // Local stand-in for the search endpoint.
    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/search")
    }

    fn source(url: &str, key: &str) -> GNewsSource {
        GNewsSource::new(key.into(), "flood".into(), "en".into(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(url)
    }

    #[tokio::test]
    async fn articles_are_returned_in_response_order() {
        use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json};
        use std::collections::HashMap;

        let app = axum::Router::new().route(
            "/search",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("apikey").map(String::as_str) != Some("k-123") {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(serde_json::json!({
                    "totalArticles": 2,
                    "articles": [
                        {"title": format!("Results for {}", q["q"]), "description": "first"},
                        {"title": "Second", "description": null}
                    ]
                }))
                .into_response()
            }),
        );
        let url = serve(app).await;

        let items = source(&url, "k-123").fetch_items().await.unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            SourceItem::News(a) => assert_eq!(a.title.as_deref(), Some("Results for flood")),
            other => panic!("unexpected item {other:?}"),
        }

        let err = source(&url, "wrong").fetch_items().await.unwrap_err();
        match err {
            SourceError::Fetch { message, .. } => assert!(message.contains("401"), "{message}"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_unreadable_body_and_empty_list() {
        use axum::{http::StatusCode, routing::get};

        let down = serve(axum::Router::new().route(
            "/search",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        ))
        .await;
        assert!(matches!(
            source(&down, "k").fetch_items().await,
            Err(SourceError::Fetch { .. })
        ));

        let garbled = serve(axum::Router::new().route(
            "/search",
            get(|| async { "<html>not json</html>" }),
        ))
        .await;
        assert!(matches!(
            source(&garbled, "k").fetch_items().await,
            Err(SourceError::Payload { .. })
        ));

        let empty = serve(axum::Router::new().route(
            "/search",
            get(|| async { axum::Json(serde_json::json!({"totalArticles": 0, "articles": []})) }),
        ))
        .await;
        assert!(source(&empty, "k").fetch_items().await.unwrap().is_empty());
    }
}

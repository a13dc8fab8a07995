// src/sources/mock_social.rs
//! Social feed stand-in: a JSON array of `{ "text": ... }` posts on disk.

use async_trait::async_trait;
use metrics::counter;
use std::path::PathBuf;

use crate::error::SourceError;
use crate::report::SourceKind;
use crate::sources::types::{SocialPost, SourceItem, SourceProvider};

pub const DEFAULT_MOCK_SOCIAL_PATH: &str = "data/mock-tweets.json";

pub struct MockSocialSource {
    path: PathBuf,
}

impl MockSocialSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub fn parse_posts(json: &str) -> Result<Vec<SocialPost>, serde_json::Error> {
    serde_json::from_str(json)
}

#[async_trait]
impl SourceProvider for MockSocialSource {
    async fn fetch_items(&self) -> Result<Vec<SourceItem>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Fetch {
                source_name: self.name(),
                message: format!("reading {}: {e}", self.path.display()),
            })?;
        let posts = parse_posts(&content).map_err(|e| SourceError::Payload {
            source_name: self.name(),
            message: e.to_string(),
        })?;
        counter!("source_items_total", "source" => self.name()).increment(posts.len() as u64);
        Ok(posts.into_iter().map(SourceItem::Social).collect())
    }

    fn name(&self) -> &'static str {
        "mock-social"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn reads_posts_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tweets.json");
        fs::write(&p, r#"[{"text":"first"},{"text":"second","user":"x"}]"#).unwrap();

        let items = MockSocialSource::new(&p).fetch_items().await.unwrap();
        assert_eq!(
            items,
            vec![
                SourceItem::Social(SocialPost { text: "first".into() }),
                SourceItem::Social(SocialPost { text: "second".into() }),
            ]
        );
    }

    #[tokio::test]
    async fn missing_file_and_bad_json_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = MockSocialSource::new(dir.path().join("nope.json"));
        assert!(matches!(
            missing.fetch_items().await,
            Err(SourceError::Fetch { .. })
        ));

        let p = dir.path().join("bad.json");
        fs::write(&p, "{not json").unwrap();
        assert!(matches!(
            MockSocialSource::new(&p).fetch_items().await,
            Err(SourceError::Payload { .. })
        ));
    }
}

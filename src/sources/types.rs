// src/sources/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::report::SourceKind;

/// Article as returned by the news API (only the fields we read).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Social post from the mock feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPost {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    News(NewsArticle),
    Social(SocialPost),
}

impl SourceItem {
    /// Rows with nothing to classify are dropped by the aggregator.
    pub fn is_malformed(&self) -> bool {
        match self {
            SourceItem::News(a) => {
                let blank = |s: &Option<String>| s.as_deref().map_or(true, |t| t.trim().is_empty());
                blank(&a.title) && blank(&a.description)
            }
            SourceItem::Social(p) => p.text.trim().is_empty(),
        }
    }
}

#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<SourceItem>, SourceError>;
    fn name(&self) -> &'static str;
    fn kind(&self) -> SourceKind;
}

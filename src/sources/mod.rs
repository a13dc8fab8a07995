// src/sources/mod.rs
pub mod gnews;
pub mod mock_social;
pub mod types;

pub use types::{NewsArticle, SocialPost, SourceItem, SourceProvider};

use std::sync::Arc;

pub type DynSource = Arc<dyn SourceProvider>;

/// Order sources NEWS before SOCIAL, keeping configured order within a kind.
pub fn order_sources(mut sources: Vec<DynSource>) -> Vec<DynSource> {
    sources.sort_by_key(|s| match s.kind() {
        crate::report::SourceKind::News => 0u8,
        crate::report::SourceKind::Social => 1,
        crate::report::SourceKind::Manual => 2,
    });
    sources
}

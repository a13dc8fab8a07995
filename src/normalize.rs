// src/normalize.rs
//! Report normalizer: turns news articles, social posts and manual
//! submissions into a uniform [`RawReport`].

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::TriageError;
use crate::report::{RawReport, SourceKind};
use crate::sources::types::{NewsArticle, SocialPost, SourceItem};

/// Decode HTML entities and collapse whitespace runs. Used on fragments coming
/// from third-party feeds only.
pub fn clean_fragment(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

pub fn normalize_news(article: &NewsArticle) -> RawReport {
    let title = clean_fragment(article.title.as_deref().unwrap_or_default());
    let description = clean_fragment(article.description.as_deref().unwrap_or_default());
    RawReport {
        source_kind: SourceKind::News,
        raw_text: format!("News: {title} - {description}"),
    }
}

pub fn normalize_social(post: &SocialPost) -> RawReport {
    RawReport {
        source_kind: SourceKind::Social,
        raw_text: format!("Tweet: {}", clean_fragment(&post.text)),
    }
}

/// Manual text is kept verbatim; only emptiness is rejected.
pub fn normalize_manual(text: &str) -> Result<RawReport, TriageError> {
    if text.trim().is_empty() {
        return Err(TriageError::Validation("Text is required".to_string()));
    }
    Ok(RawReport {
        source_kind: SourceKind::Manual,
        raw_text: text.to_string(),
    })
}

pub fn normalize(item: &SourceItem) -> RawReport {
    match item {
        SourceItem::News(a) => normalize_news(a),
        SourceItem::Social(p) => normalize_social(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: Option<&str>, description: Option<&str>) -> NewsArticle {
        NewsArticle {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            url: None,
        }
    }

    #[test]
    fn news_item_uses_title_dash_description() {
        let raw = normalize_news(&article(Some("Flood"), Some("Area submerged")));
        assert_eq!(raw.source_kind, SourceKind::News);
        assert_eq!(raw.raw_text, "News: Flood - Area submerged");
    }

    #[test]
    fn news_fragments_are_cleaned() {
        let raw = normalize_news(&article(Some("Fire&nbsp;&amp; smoke"), Some("  two\n lines ")));
        assert_eq!(raw.raw_text, "News: Fire & smoke - two lines");
    }

    #[test]
    fn missing_description_renders_empty() {
        let raw = normalize_news(&article(Some("Quake"), None));
        assert_eq!(raw.raw_text, "News: Quake - ");
    }

    #[test]
    fn social_post_is_prefixed() {
        let raw = normalize_social(&SocialPost {
            text: "trapped under rubble".into(),
        });
        assert_eq!(raw.source_kind, SourceKind::Social);
        assert_eq!(raw.raw_text, "Tweet: trapped under rubble");
    }

    #[test]
    fn manual_rejects_blank_text() {
        assert!(matches!(normalize_manual(""), Err(TriageError::Validation(_))));
        assert!(matches!(normalize_manual(" \t\n"), Err(TriageError::Validation(_))));
    }

    #[test]
    fn manual_text_is_verbatim() {
        let raw = normalize_manual("  Bridge collapsed  ").unwrap();
        assert_eq!(raw.source_kind, SourceKind::Manual);
        assert_eq!(raw.raw_text, "  Bridge collapsed  ");
    }
}

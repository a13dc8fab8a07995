// src/bootstrap.rs
//! Builds every collaborator from [`AppConfig`] and wires them into [`AppState`].

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::aggregate::FeedAggregator;
use crate::api::AppState;
use crate::auth::TokenAuthority;
use crate::classify::{build_classifier_from_config, classify_or_fallback, DynClassifier};
use crate::config::AppConfig;
use crate::sources::{gnews::GNewsSource, mock_social::MockSocialSource, DynSource};
use crate::store::JsonlStore;
use crate::triage::TriageService;

pub struct AppRuntime {
    pub cfg: AppConfig,
    pub classifier: DynClassifier,
    pub state: AppState,
}

pub fn build_sources(cfg: &AppConfig) -> anyhow::Result<Vec<DynSource>> {
    let mut sources: Vec<DynSource> = Vec::new();
    let s = &cfg.sources;
    if s.news_enabled {
        let news = GNewsSource::new(
            s.news_api_key.clone(),
            s.news_query.clone(),
            s.news_lang.clone(),
            Duration::from_millis(s.news_timeout_ms),
        )?;
        sources.push(Arc::new(news));
    }
    if s.social_enabled {
        sources.push(Arc::new(MockSocialSource::new(s.social_path.clone())));
    }
    Ok(sources)
}

impl AppRuntime {
    pub fn from_config(cfg: AppConfig) -> anyhow::Result<Self> {
        // Safe diagnostics: only provider + key lengths
        info!(
            target: "bootstrap",
            provider = %cfg.classifier.provider,
            key_len = cfg.classifier.api_key.len(),
            news_key_len = cfg.sources.news_api_key.len(),
            cache = cfg.classifier.cache_capacity,
            "config loaded"
        );

        let classifier = build_classifier_from_config(&cfg.classifier)?;
        let sources = build_sources(&cfg)?;

        let feed = FeedAggregator::new(sources, classifier.clone())
            .with_source_timeout(Duration::from_millis(cfg.feed.source_timeout_ms))
            .with_dedup(cfg.feed.dedup_identical);

        let store = Arc::new(JsonlStore::new(cfg.store.path.clone()));
        let auth = TokenAuthority::new(cfg.auth.secret.clone(), cfg.auth.token_ttl_secs);
        if !auth.is_configured() {
            warn!(target: "bootstrap", "AUTH_SECRET is not set; protected routes will reject every request");
        }

        let state = AppState {
            triage: TriageService::new(classifier.clone(), store),
            feed: Arc::new(feed),
            auth: Arc::new(auth),
        };
        Ok(Self {
            cfg,
            classifier,
            state,
        })
    }

    pub fn from_default_config() -> anyhow::Result<Self> {
        Self::from_config(AppConfig::load_default()?)
    }

    /// One-off classifier smoke test. Never fails; logs the outcome.
    pub async fn quick_probe(&self) {
        let sample = "Family of four trapped on a rooftop as flood water keeps rising on Elm Street.";
        let out = classify_or_fallback(self.classifier.as_ref(), sample).await;
        info!(
            target: "bootstrap",
            provider = self.classifier.provider_name(),
            urgency = %out.urgency_level,
            "classifier quick probe"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_follow_config_flags() {
        let mut cfg = AppConfig::default();
        assert_eq!(build_sources(&cfg).unwrap().len(), 2);
        cfg.sources.news_enabled = false;
        let only = build_sources(&cfg).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name(), "mock-social");
    }

    #[test]
    fn runtime_builds_with_mock_provider() {
        let cfg = AppConfig::from_toml_str(
            r#"
[classifier]
provider = "mock"

[auth]
secret = "abc"
"#,
        )
        .unwrap();
        let rt = AppRuntime::from_config(cfg).unwrap();
        assert_eq!(rt.classifier.provider_name(), "mock");
        assert!(rt.state.auth.is_configured());
        assert_eq!(rt.state.feed.source_names(), vec!["gnews", "mock-social"]);
    }
}

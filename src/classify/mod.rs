// src/classify/mod.rs
//! Classifier port: provider abstraction, fallback policy and factory.

pub mod cache;
pub mod llm;
pub mod parse;
pub mod stub;

use async_trait::async_trait;
use futures::StreamExt;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AiConfig;
use crate::error::ClassifyError;
use crate::report::ClassifiedReport;
use crate::telemetry::anon_id;

pub use cache::CachingClassifier;
pub use llm::{GeminiProvider, LlmClassifier, OpenAiProvider};
pub use stub::KeywordClassifier;

pub type ClassifyResult = Result<ClassifiedReport, ClassifyError>;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> ClassifyResult;

    /// Order-preserving and the same length as `texts`. One failed item never
    /// affects the others.
    async fn classify_batch(&self, texts: &[String]) -> Vec<ClassifyResult> {
        let pending: Vec<_> = texts.iter().map(|t| self.classify(t)).collect();
        futures::stream::iter(pending)
            .buffered(self.batch_concurrency().max(1))
            .collect()
            .await
    }

    /// Upper bound on concurrent `classify` calls inside a batch.
    fn batch_concurrency(&self) -> usize {
        4
    }

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Apply the fallback policy to one classifier outcome: failures become an
/// IGNORE report and are logged + counted.
pub fn resolve_outcome(text: &str, outcome: ClassifyResult, provider: &'static str) -> ClassifiedReport {
    match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(
                target: "classifier",
                id = %anon_id(text),
                provider,
                reason = e.kind(),
                error = %e,
                "classification failed, using IGNORE fallback"
            );
            counter!("classifier_fallback_total", "reason" => e.kind()).increment(1);
            ClassifiedReport::fallback(text)
        }
    }
}

/// Single classification with the fallback applied.
pub async fn classify_or_fallback(classifier: &dyn Classifier, text: &str) -> ClassifiedReport {
    let outcome = classifier.classify(text).await;
    resolve_outcome(text, outcome, classifier.provider_name())
}

/// Factory: build a classifier according to config and environment.
///
/// * `AI_TEST_MODE=mock` or provider `mock` → deterministic keyword classifier.
/// * `gemini` / `openai` → LLM adapter over HTTP.
///
/// Every variant is wrapped in the in-memory cache unless `cache_capacity == 0`.
pub fn build_classifier_from_config(config: &AiConfig) -> anyhow::Result<DynClassifier> {
    let concurrency = config.batch_concurrency;
    let call_timeout = Duration::from_millis(config.timeout_ms);
    let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

    let provider = if AiConfig::test_mode_mock() {
        "mock"
    } else {
        config.provider.as_str()
    };

    let base: DynClassifier = match provider {
        "mock" => Arc::new(KeywordClassifier::new().with_concurrency(concurrency)),
        "gemini" => {
            let p = GeminiProvider::new(
                config.api_key.clone(),
                config.model.as_deref(),
                call_timeout,
                connect_timeout,
            )?;
            Arc::new(LlmClassifier::new(p, call_timeout, concurrency))
        }
        "openai" => {
            let p = OpenAiProvider::new(
                config.api_key.clone(),
                config.model.as_deref(),
                call_timeout,
                connect_timeout,
            )?;
            Arc::new(LlmClassifier::new(p, call_timeout, concurrency))
        }
        other => anyhow::bail!("Unsupported classifier provider in config: {other}"),
    };

    if config.cache_capacity == 0 {
        return Ok(base);
    }
    Ok(Arc::new(CachingClassifier::new(base, config.cache_capacity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::UrgencyLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on texts containing "bad", echoes LOW otherwise; records peak concurrency.
    struct Flaky {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for Flaky {
        async fn classify(&self, text: &str) -> ClassifyResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            // Later items finish first to prove order is restored.
            let delay = 30u64.saturating_sub(text.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if text.contains("bad") {
                return Err(ClassifyError::MalformedOutput("bad".into()));
            }
            let mut r = ClassifiedReport::fallback(text);
            r.urgency_level = UrgencyLevel::Low;
            Ok(r)
        }
        fn batch_concurrency(&self) -> usize {
            2
        }
        fn provider_name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn batch_preserves_order_and_isolates_failures() {
        let c = Flaky {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let texts: Vec<String> = vec!["a".into(), "bad item".into(), "ccccccccc".into()];
        let out = c.classify_batch(&texts).await;

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().text, "a");
        assert!(out[1].is_err());
        assert_eq!(out[2].as_ref().unwrap().text, "ccccccccc");
        assert!(c.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn batch_through_trait_object_keeps_length_and_order() {
        let c: DynClassifier = Arc::new(KeywordClassifier::new().with_concurrency(2));
        let texts: Vec<String> = vec![
            "Lovely weather today".into(),
            "Family trapped in basement".into(),
            "Bridge closed on route 9".into(),
        ];
        let out = c.classify_batch(&texts).await;
        let levels: Vec<UrgencyLevel> = out.iter().map(|r| r.as_ref().unwrap().urgency_level).collect();
        assert_eq!(
            levels,
            vec![UrgencyLevel::Low, UrgencyLevel::Critical, UrgencyLevel::Medium]
        );
        assert!(c.classify_batch(&[]).await.is_empty());
    }

    #[test]
    fn resolve_outcome_substitutes_fallback() {
        let r = resolve_outcome(
            "text",
            Err(ClassifyError::Unavailable("down".into())),
            "test",
        );
        assert_eq!(r.urgency_level, UrgencyLevel::Ignore);
        assert_eq!(r.summary, "text");
    }

    #[serial_test::serial]
    #[test]
    fn factory_honours_mock_mode_and_rejects_unknown_provider() {
        std::env::set_var("AI_TEST_MODE", "mock");
        let cfg = AiConfig {
            provider: "gemini".into(),
            cache_capacity: 0,
            ..AiConfig::default()
        };
        let c = build_classifier_from_config(&cfg).unwrap();
        assert_eq!(c.provider_name(), "mock");
        std::env::remove_var("AI_TEST_MODE");

        let bad = AiConfig {
            provider: "claude".into(),
            ..AiConfig::default()
        };
        assert!(build_classifier_from_config(&bad).is_err());
    }
}

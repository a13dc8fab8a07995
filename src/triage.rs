// src/triage.rs
//! Manual submission flow: normalize → classify → respond, with a detached
//! best-effort write of the audit record.

use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::classify::{classify_or_fallback, DynClassifier};
use crate::error::TriageError;
use crate::normalize::normalize_manual;
use crate::report::{ClassifiedReport, TriageRecord};
use crate::store::TriageStore;
use crate::telemetry::anon_id;

pub type DynStore = Arc<dyn TriageStore>;

#[derive(Clone)]
pub struct TriageService {
    classifier: DynClassifier,
    store: DynStore,
}

impl TriageService {
    pub fn new(classifier: DynClassifier, store: DynStore) -> Self {
        Self { classifier, store }
    }

    /// Classify one manual report. The audit write is spawned and not awaited.
    pub async fn submit_manual_report(&self, text: &str) -> Result<ClassifiedReport, TriageError> {
        self.submit_tracked(text).await.map(|(report, _)| report)
    }

    /// Same as [`submit_manual_report`](Self::submit_manual_report) but also
    /// returns the persistence task, so callers that care can await it.
    pub async fn submit_tracked(
        &self,
        text: &str,
    ) -> Result<(ClassifiedReport, JoinHandle<()>), TriageError> {
        let raw = normalize_manual(text)?;
        counter!("triage_submissions_total").increment(1);

        let report = classify_or_fallback(self.classifier.as_ref(), &raw.raw_text).await;
        tracing::info!(
            target: "triage",
            id = %anon_id(&raw.raw_text),
            urgency = %report.urgency_level,
            "manual report classified"
        );

        let handle = self.spawn_persist(TriageRecord::from_classified(&raw.raw_text, &report));
        Ok((report, handle))
    }

    /// At-most-once audit write. Failures are logged; the caller already has
    /// its answer.
    fn spawn_persist(&self, record: TriageRecord) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.append(&record).await {
                tracing::error!(
                    target: "store",
                    store = store.name(),
                    id = %anon_id(&record.text),
                    error = %e,
                    "failed to persist triage record"
                );
                counter!("store_errors_total").increment(1);
            }
        })
    }
}

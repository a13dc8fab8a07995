// src/aggregate.rs
//! Feed aggregator: pull every source, normalize, classify in one batch and
//! hand the result to the priority sorter.

use futures::future::join_all;
use metrics::counter;
use std::collections::HashSet;
use std::time::Duration;

use crate::classify::{resolve_outcome, DynClassifier};
use crate::error::{ClassifyError, SourceError, TriageError};
use crate::normalize::normalize;
use crate::priority::{self, SortedFeed};
use crate::report::{ClassifiedReport, RawReport};
use crate::sources::{order_sources, DynSource, SourceItem};

/// What happened during one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// (source name, rows kept) in pull order.
    pub per_source: Vec<(&'static str, usize)>,
    pub failed_sources: Vec<&'static str>,
    pub malformed: usize,
    pub deduped: usize,
    pub fallbacks: usize,
    pub classifier_unavailable: usize,
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Classified reports in arrival order (unsorted).
    pub reports: Vec<ClassifiedReport>,
    pub stats: AggregateStats,
}

pub struct FeedAggregator {
    sources: Vec<DynSource>,
    classifier: DynClassifier,
    source_timeout: Duration,
    dedup_identical: bool,
}

impl FeedAggregator {
    /// Sources are reordered NEWS before SOCIAL; order within a kind is kept.
    pub fn new(sources: Vec<DynSource>, classifier: DynClassifier) -> Self {
        Self {
            sources: order_sources(sources),
            classifier,
            source_timeout: Duration::from_secs(10),
            dedup_identical: false,
        }
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn with_dedup(mut self, on: bool) -> Self {
        self.dedup_identical = on;
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    async fn fetch_one(&self, source: &DynSource) -> Result<Vec<SourceItem>, SourceError> {
        match tokio::time::timeout(self.source_timeout, source.fetch_items()).await {
            Ok(res) => res,
            Err(_) => Err(SourceError::Timeout {
                source_name: source.name(),
                timeout_ms: self.source_timeout.as_millis() as u64,
            }),
        }
    }

    /// Fetch all sources (concurrently) and normalize in source order.
    /// A failing source contributes nothing.
    pub async fn collect_raw(&self) -> (Vec<RawReport>, AggregateStats) {
        let fetched = join_all(self.sources.iter().map(|s| self.fetch_one(s))).await;

        let mut stats = AggregateStats::default();
        let mut raw = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (source, res) in self.sources.iter().zip(fetched) {
            let items = match res {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(target: "feed", source = source.name(), error = %e, "source failed, contributing zero items");
                    counter!("source_errors_total", "source" => source.name()).increment(1);
                    stats.failed_sources.push(source.name());
                    stats.per_source.push((source.name(), 0));
                    continue;
                }
            };

            let mut kept = 0usize;
            for item in items {
                if item.is_malformed() {
                    stats.malformed += 1;
                    continue;
                }
                let report = normalize(&item);
                if self.dedup_identical && !seen.insert(report.raw_text.clone()) {
                    stats.deduped += 1;
                    continue;
                }
                raw.push(report);
                kept += 1;
            }
            stats.per_source.push((source.name(), kept));
        }

        counter!("feed_malformed_total").increment(stats.malformed as u64);
        counter!("feed_dedup_total").increment(stats.deduped as u64);
        (raw, stats)
    }

    /// Classify every collected report; order is arrival order.
    pub async fn aggregate(&self) -> Aggregation {
        let (raw, mut stats) = self.collect_raw().await;
        let texts: Vec<String> = raw.into_iter().map(|r| r.raw_text).collect();

        let outcomes = self.classifier.classify_batch(&texts).await;
        let provider = self.classifier.provider_name();

        let reports = texts
            .iter()
            .zip(outcomes)
            .map(|(text, outcome)| {
                if let Err(e) = &outcome {
                    stats.fallbacks += 1;
                    if matches!(e, ClassifyError::Unavailable(_)) {
                        stats.classifier_unavailable += 1;
                    }
                }
                resolve_outcome(text, outcome, provider)
            })
            .collect::<Vec<_>>();

        Aggregation { reports, stats }
    }

    /// Aggregate and sort. Only a run where every source failed is an error;
    /// classifier failures are already folded into IGNORE fallbacks.
    pub async fn sorted_feed(&self) -> Result<SortedFeed, TriageError> {
        counter!("feed_runs_total").increment(1);
        let Aggregation { reports, stats } = self.aggregate().await;

        if !self.sources.is_empty() && stats.failed_sources.len() == self.sources.len() {
            return Err(TriageError::FeedUnavailable(format!(
                "all sources failed: {:?}",
                stats.failed_sources
            )));
        }

        let feed = priority::sort(reports);
        tracing::info!(
            target: "feed",
            items = feed.len(),
            per_source = ?stats.per_source,
            failed = ?stats.failed_sources,
            malformed = stats.malformed,
            deduped = stats.deduped,
            fallbacks = stats.fallbacks,
            classifier_unavailable = stats.classifier_unavailable,
            levels = ?feed.level_counts(),
            "feed aggregated"
        );
        Ok(feed)
    }
}

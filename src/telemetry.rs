// src/telemetry.rs
//! Tracing setup, metric descriptors and log-safe report ids.

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Short anonymized id for a report text. Raw text never goes to the log.
pub fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..6])
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sireneye=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "classifier_calls_total",
            "Classifier calls by provider and outcome."
        );
        describe_counter!(
            "classifier_fallback_total",
            "Reports that received the IGNORE fallback, by reason."
        );
        describe_counter!(
            "classifier_anomaly_total",
            "Out-of-schema values coerced at the parsing boundary."
        );
        describe_counter!("classifier_cache_hits_total", "Classification cache hits.");
        describe_histogram!("classifier_call_ms", "Classifier call latency in milliseconds.");
        describe_counter!("source_items_total", "Raw items fetched per source.");
        describe_counter!(
            "source_errors_total",
            "Source fetch failures (zero items contributed)."
        );
        describe_histogram!("source_fetch_ms", "Source fetch latency in milliseconds.");
        describe_counter!("feed_malformed_total", "Source rows dropped as malformed.");
        describe_counter!("feed_dedup_total", "Source rows dropped as duplicates.");
        describe_counter!("feed_runs_total", "Feed aggregation runs.");
        describe_counter!("triage_submissions_total", "Manual triage submissions.");
        describe_counter!(
            "store_errors_total",
            "Persistence hand-offs that failed after the response was sent."
        );
        describe_counter!("auth_rejected_total", "Requests rejected by the auth gate.");
    });
}

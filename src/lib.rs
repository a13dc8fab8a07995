// src/lib.rs
// Public library surface for integration tests (and the binary).

pub mod aggregate;
pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod classify;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod priority;
pub mod report;
pub mod sources;
pub mod store;
pub mod telemetry;
pub mod triage;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::classify::{Classifier, DynClassifier};
pub use crate::error::{ClassifyError, TriageError};
pub use crate::report::{ClassifiedReport, IncidentCategory, RawReport, SourceKind, UrgencyLevel};

// src/report.rs
//! Report data model: raw inputs, closed classification enums and the
//! classified record the UI consumes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum characters kept in a fallback summary.
pub const FALLBACK_SUMMARY_MAX: usize = 160;

/// Where a raw report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    News,
    Social,
    Manual,
}

/// Uniform report record produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReport {
    pub source_kind: SourceKind,
    pub raw_text: String,
}

/// Urgency levels, declared in response-priority order (CRITICAL first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
    Ignore,
}

impl UrgencyLevel {
    pub const ALL: [UrgencyLevel; 5] = [
        UrgencyLevel::Critical,
        UrgencyLevel::High,
        UrgencyLevel::Medium,
        UrgencyLevel::Low,
        UrgencyLevel::Ignore,
    ];

    /// Sort rank: CRITICAL=0 .. IGNORE=4.
    pub fn rank(self) -> u8 {
        match self {
            UrgencyLevel::Critical => 0,
            UrgencyLevel::High => 1,
            UrgencyLevel::Medium => 2,
            UrgencyLevel::Low => 3,
            UrgencyLevel::Ignore => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "CRITICAL",
            UrgencyLevel::High => "HIGH",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::Low => "LOW",
            UrgencyLevel::Ignore => "IGNORE",
        }
    }

    /// Case-insensitive parse of a model label. `None` for anything outside the enum.
    pub fn parse_label(s: &str) -> Option<Self> {
        let t = s.trim();
        Self::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(t))
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentCategory {
    Fire,
    Flood,
    Medical,
    Trapped,
    Infrastructure,
    Other,
}

impl IncidentCategory {
    pub const ALL: [IncidentCategory; 6] = [
        IncidentCategory::Fire,
        IncidentCategory::Flood,
        IncidentCategory::Medical,
        IncidentCategory::Trapped,
        IncidentCategory::Infrastructure,
        IncidentCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentCategory::Fire => "Fire",
            IncidentCategory::Flood => "Flood",
            IncidentCategory::Medical => "Medical",
            IncidentCategory::Trapped => "Trapped",
            IncidentCategory::Infrastructure => "Infrastructure",
            IncidentCategory::Other => "Other",
        }
    }

    pub fn parse_label(s: &str) -> Option<Self> {
        let t = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(t))
    }
}

/// A report after classification. Field names match the JSON keys the model
/// is asked for, which is also what the UI reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedReport {
    pub text: String,
    pub urgency_level: UrgencyLevel,
    pub incident_category: Option<IncidentCategory>,
    pub location_extracted: Option<String>,
    pub people_affected: Option<String>,
    pub resources_needed: Option<String>,
    pub summary: String,
}

impl ClassifiedReport {
    /// Substitute used when the classifier fails for `text`.
    pub fn fallback(text: &str) -> Self {
        Self {
            text: text.to_string(),
            urgency_level: UrgencyLevel::Ignore,
            incident_category: None,
            location_extracted: None,
            people_affected: None,
            resources_needed: None,
            summary: truncate_summary(text, FALLBACK_SUMMARY_MAX),
        }
    }
}

/// Persisted audit row for a manual submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRecord {
    pub text: String,
    #[serde(rename = "urgencyLevel")]
    pub urgency_level: String,
}

impl TriageRecord {
    pub fn from_classified(text: &str, report: &ClassifiedReport) -> Self {
        Self {
            text: text.to_string(),
            urgency_level: report.urgency_level.as_str().to_string(),
        }
    }
}

/// Char-boundary safe truncation; appends an ellipsis when cut.
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push('…');
    out
}

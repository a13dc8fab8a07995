// src/priority.rs
//! Priority sorter: stable total order over classified reports by urgency.

use crate::report::{ClassifiedReport, UrgencyLevel};

/// Rank used for anything outside the urgency enumeration (same as IGNORE).
pub const UNKNOWN_RANK: u8 = 4;

/// Rank for a free-form level label. Case-insensitive; unknown labels rank as IGNORE.
pub fn rank_of(label: &str) -> u8 {
    UrgencyLevel::parse_label(label)
        .map(UrgencyLevel::rank)
        .unwrap_or(UNKNOWN_RANK)
}

/// Reports ordered CRITICAL first, IGNORE last. Ties keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct SortedFeed(Vec<ClassifiedReport>);

impl SortedFeed {
    pub fn as_slice(&self) -> &[ClassifiedReport] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-level counts in rank order, for logs.
    pub fn level_counts(&self) -> [usize; 5] {
        let mut counts = [0usize; 5];
        for r in &self.0 {
            counts[r.urgency_level.rank() as usize] += 1;
        }
        counts
    }
}

/// `slice::sort_by_key` is a stable sort, which is what keeps equal-urgency
/// items in arrival order.
pub fn sort(mut reports: Vec<ClassifiedReport>) -> SortedFeed {
    reports.sort_by_key(|r| r.urgency_level.rank());
    SortedFeed(reports)
}

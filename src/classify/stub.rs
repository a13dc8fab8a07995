// src/classify/stub.rs
//! Deterministic keyword classifier for local runs and tests (`AI_TEST_MODE=mock`).

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;

use super::{Classifier, ClassifyResult};
use crate::report::{truncate_summary, ClassifiedReport, IncidentCategory, UrgencyLevel};

/// Ordered rules: the first rule with a matching keyword wins. Keywords match
/// whole words only.
const RULES: &[(&[&str], UrgencyLevel, IncidentCategory)] = &[
    (
        &["trapped", "rubble", "buried", "collapsed on"],
        UrgencyLevel::Critical,
        IncidentCategory::Trapped,
    ),
    (
        &["fire", "fires", "smoke", "burning", "wildfire", "wildfires", "blaze"],
        UrgencyLevel::High,
        IncidentCategory::Fire,
    ),
    (
        &["flood", "floods", "flooded", "flooding", "submerged", "water rising", "levee"],
        UrgencyLevel::High,
        IncidentCategory::Flood,
    ),
    (
        &["injured", "injuries", "bleeding", "medical", "unconscious", "ambulance"],
        UrgencyLevel::High,
        IncidentCategory::Medical,
    ),
    (
        &["bridge", "road", "roads", "power", "outage", "pipe", "gas leak"],
        UrgencyLevel::Medium,
        IncidentCategory::Infrastructure,
    ),
];

fn compiled_rules() -> &'static [(Regex, UrgencyLevel, IncidentCategory)] {
    static COMPILED: OnceCell<Vec<(Regex, UrgencyLevel, IncidentCategory)>> = OnceCell::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(keywords, u, c)| {
                let alts: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
                let re = Regex::new(&format!(r"(?i)\b(?:{})\b", alts.join("|")))
                    .expect("keyword regex");
                (re, *u, *c)
            })
            .collect()
    })
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    concurrency: usize,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self { concurrency: 4 }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Pure function of `text`.
    pub fn classify_text(text: &str) -> ClassifiedReport {
        let (urgency_level, category) = compiled_rules()
            .iter()
            .find(|(re, _, _)| re.is_match(text))
            .map(|(_, u, c)| (*u, *c))
            .unwrap_or((UrgencyLevel::Low, IncidentCategory::Other));

        ClassifiedReport {
            text: text.to_string(),
            urgency_level,
            incident_category: Some(category),
            location_extracted: None,
            people_affected: None,
            resources_needed: None,
            summary: truncate_summary(text, 120),
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> ClassifyResult {
        Ok(Self::classify_text(text))
    }

    fn batch_concurrency(&self) -> usize {
        self.concurrency
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// src/classify/parse.rs
//! Maps raw model output onto the closed [`ClassifiedReport`] schema.

use metrics::counter;
use serde_json::{Map, Value};

use crate::error::ClassifyError;
use crate::report::{ClassifiedReport, IncidentCategory, UrgencyLevel};
use crate::telemetry::anon_id;

/// Strip Markdown code fences the model likes to wrap JSON in.
pub fn strip_code_fences(s: &str) -> String {
    s.replace("```json", "").replace("```", "").trim().to_string()
}

/// Absent-value rules: JSON null, empty string and the literal "null"/"none"/"n/a".
fn optional_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty()
                || t.eq_ignore_ascii_case("null")
                || t.eq_ignore_ascii_case("none")
                || t.eq_ignore_ascii_case("n/a")
            {
                None
            } else {
                Some(t.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|it| optional_text(Some(it)))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(_) => None,
    }
}

fn category_of(obj: &Map<String, Value>, text: &str) -> Option<IncidentCategory> {
    let label = optional_text(obj.get("incident_category"))?;
    match IncidentCategory::parse_label(&label) {
        Some(c) => Some(c),
        None => {
            tracing::warn!(
                target: "classifier",
                id = %anon_id(text),
                value = %label,
                "incident_category outside schema, coerced to null"
            );
            counter!("classifier_anomaly_total", "field" => "incident_category").increment(1);
            None
        }
    }
}

/// Parse one model response for `text`. The report's `text` is always the input,
/// never whatever the model echoed back.
pub fn parse_classification(text: &str, raw: &str) -> Result<ClassifiedReport, ClassifyError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| ClassifyError::MalformedOutput(format!("not JSON: {e}")))?;

    // Some models answer a single-item prompt with a one-element array.
    let obj = match value {
        Value::Object(o) => o,
        Value::Array(mut items) if items.len() == 1 => match items.pop() {
            Some(Value::Object(o)) => o,
            _ => return Err(ClassifyError::MalformedOutput("expected an object".into())),
        },
        _ => return Err(ClassifyError::MalformedOutput("expected an object".into())),
    };

    let urgency_label = optional_text(obj.get("urgency_level"))
        .ok_or_else(|| ClassifyError::MalformedOutput("missing urgency_level".into()))?;
    let urgency_level = UrgencyLevel::parse_label(&urgency_label).ok_or_else(|| {
        counter!("classifier_anomaly_total", "field" => "urgency_level").increment(1);
        ClassifyError::MalformedOutput(format!("urgency_level {urgency_label:?} outside schema"))
    })?;

    let summary = optional_text(obj.get("summary"))
        .ok_or_else(|| ClassifyError::MalformedOutput("missing summary".into()))?;

    Ok(ClassifiedReport {
        text: text.to_string(),
        urgency_level,
        incident_category: category_of(&obj, text),
        location_extracted: optional_text(obj.get("location_extracted")),
        people_affected: optional_text(obj.get("people_affected")),
        resources_needed: optional_text(obj.get("resources_needed")),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "urgency_level": "CRITICAL",
        "incident_category": "Trapped",
        "location_extracted": "5th and Main",
        "people_affected": 3,
        "resources_needed": ["rescue team", "ambulance"],
        "summary": "Three people trapped under rubble."
    }"#;

    #[test]
    fn parses_full_object() {
        let r = parse_classification("input", FULL).unwrap();
        assert_eq!(r.text, "input");
        assert_eq!(r.urgency_level, UrgencyLevel::Critical);
        assert_eq!(r.incident_category, Some(IncidentCategory::Trapped));
        assert_eq!(r.location_extracted.as_deref(), Some("5th and Main"));
        assert_eq!(r.people_affected.as_deref(), Some("3"));
        assert_eq!(r.resources_needed.as_deref(), Some("rescue team, ambulance"));
    }

    #[test]
    fn strips_code_fences() {
        let fenced = format!("```json\n{FULL}\n```");
        assert!(parse_classification("x", &fenced).is_ok());
    }

    #[test]
    fn null_strings_become_none() {
        let raw = r#"{"urgency_level":"low","incident_category":"null","location_extracted":"null",
                      "people_affected":null,"resources_needed":"","summary":"Minor."}"#;
        let r = parse_classification("x", raw).unwrap();
        assert_eq!(r.urgency_level, UrgencyLevel::Low);
        assert_eq!(r.incident_category, None);
        assert_eq!(r.location_extracted, None);
        assert_eq!(r.people_affected, None);
        assert_eq!(r.resources_needed, None);
    }

    #[test]
    fn unknown_category_is_coerced_to_none() {
        let raw = r#"{"urgency_level":"HIGH","incident_category":"Earthquake","summary":"Quake."}"#;
        let r = parse_classification("x", raw).unwrap();
        assert_eq!(r.urgency_level, UrgencyLevel::High);
        assert_eq!(r.incident_category, None);
    }

    #[test]
    fn unknown_urgency_is_malformed() {
        let raw = r#"{"urgency_level":"URGENT","summary":"?"}"#;
        assert!(matches!(
            parse_classification("x", raw),
            Err(ClassifyError::MalformedOutput(_))
        ));
    }

    #[test]
    fn missing_keys_and_non_json_are_malformed() {
        for raw in [
            r#"{"summary":"no level"}"#,
            r#"{"urgency_level":"LOW"}"#,
            "Sorry, I cannot help with that.",
            r#"[{"urgency_level":"LOW","summary":"a"},{"urgency_level":"LOW","summary":"b"}]"#,
        ] {
            assert!(
                matches!(parse_classification("x", raw), Err(ClassifyError::MalformedOutput(_))),
                "expected malformed for {raw}"
            );
        }
    }

    #[test]
    fn single_element_array_is_accepted() {
        let raw = r#"[{"urgency_level":"MEDIUM","summary":"Road blocked."}]"#;
        let r = parse_classification("x", raw).unwrap();
        assert_eq!(r.urgency_level, UrgencyLevel::Medium);
    }
}

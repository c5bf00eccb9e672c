// Field-by-field conversion of the parsed payload into the typed model.
// Every repair decision lives here: wrong types and unknown enum values are
// defaulted and noted in `warnings`, never escalated. Warnings describe the
// field, never its content.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::geometry::collect_boxes;
use super::parser::ANOMALIES_KEY;
use super::types::{
    Citation, DiagnosticRecord, Finding, OverallSummary, Severity, Triage, VitalMetrics,
};

/// Validated record plus the repairs applied to reach it.
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    pub record: DiagnosticRecord,
    pub warnings: Vec<String>,
}

/// Convert a payload object (already known to carry `anomalies`) into a record.
///
/// A non-object finding is skipped; one bad entry never discards the rest.
pub fn validate_record(root: &Map<String, Value>) -> ValidatedRecord {
    let mut warnings = Vec::new();

    let overall_summary = match root.get("overall_summary") {
        None | Some(Value::Null) => None,
        Some(Value::Object(obj)) => Some(validate_summary(obj, &mut warnings)),
        Some(_) => {
            warnings.push("'overall_summary' is not an object; ignored".to_string());
            None
        }
    };

    let mut anomalies = Vec::new();
    match root.get(ANOMALIES_KEY) {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                match item.as_object() {
                    Some(obj) => anomalies.push(validate_finding(obj, i, &mut warnings)),
                    None => warnings.push(format!("Finding {i} is not an object; skipped")),
                }
            }
        }
        _ => warnings.push(format!("'{ANOMALIES_KEY}' is not a list; treated as empty")),
    }

    if !warnings.is_empty() {
        tracing::warn!(
            repairs = warnings.len(),
            findings = anomalies.len(),
            "Diagnostic payload repaired during validation"
        );
    }

    ValidatedRecord {
        record: DiagnosticRecord {
            overall_summary,
            anomalies,
        },
        warnings,
    }
}

fn validate_summary(obj: &Map<String, Value>, warnings: &mut Vec<String>) -> OverallSummary {
    let ctx = "Summary";
    OverallSummary {
        summary: text_field(obj, "summary", ctx, warnings),
        triage: triage_field(obj, ctx, warnings),
        next_steps: text_list(obj, "next_steps", ctx, warnings),
        disclaimer: text_field(obj, "disclaimer", ctx, warnings),
    }
}

/// Convert one finding object. Geometry comes from `collect_boxes`.
pub fn validate_finding(
    obj: &Map<String, Value>,
    index: usize,
    warnings: &mut Vec<String>,
) -> Finding {
    let ctx = format!("Finding {index}");
    Finding {
        name: text_field(obj, "name", &ctx, warnings),
        likely_condition: optional_text(obj, "likely_condition", &ctx, warnings),
        severity: severity_field(obj, &ctx, warnings),
        confidence: confidence_field(obj, &ctx, warnings),
        description: text_field(obj, "description", &ctx, warnings),
        measurements: measurements_field(obj, &ctx, warnings),
        explanation: text_field(obj, "explanation", &ctx, warnings),
        suggestion: text_field(obj, "suggestion", &ctx, warnings),
        differentials: text_list(obj, "differentials", &ctx, warnings),
        citations: citations_field(obj, &ctx, warnings),
        boxes: collect_boxes(obj, index, warnings),
    }
}

/// Every metric defaults to empty when missing or not text. Mandatory-field
/// repair is a separate pass (`metrics::repair_mandatory`).
pub fn validate_metrics(obj: &Map<String, Value>) -> VitalMetrics {
    let get = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };

    VitalMetrics {
        temperature: get("temperature"),
        weight: get("weight"),
        height: get("height"),
        heart_rate: get("heart_rate"),
        blood_pressure: get("blood_pressure"),
        respiratory_rate: get("respiratory_rate"),
        oxygen_saturation: get("oxygen_saturation"),
        glucose_level: get("glucose_level"),
        cholesterol_level: get("cholesterol_level"),
        symptoms: get("symptoms"),
    }
}

// ── Field helpers ─────────────────────────────────────────

fn text_field(obj: &Map<String, Value>, key: &str, ctx: &str, warnings: &mut Vec<String>) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            warnings.push(format!("{ctx}: '{key}' is not text; defaulted to empty"));
            String::new()
        }
    }
}

/// Blank text counts as absent.
fn optional_text(
    obj: &Map<String, Value>,
    key: &str,
    ctx: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    Some(text_field(obj, key, ctx, warnings)).filter(|s| !s.trim().is_empty())
}

/// A lone string is accepted as a one-item list; non-text items are dropped.
fn text_list(
    obj: &Map<String, Value>,
    key: &str,
    ctx: &str,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let kept: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            let dropped = items.len() - kept.len();
            if dropped > 0 {
                warnings.push(format!("{ctx}: dropped {dropped} non-text '{key}' entries"));
            }
            kept
        }
        Some(Value::String(s)) if !s.trim().is_empty() => {
            warnings.push(format!("{ctx}: '{key}' was a single string; wrapped in a list"));
            vec![s.clone()]
        }
        Some(_) => {
            warnings.push(format!("{ctx}: '{key}' is not a list; defaulted to empty"));
            Vec::new()
        }
    }
}

fn severity_field(
    obj: &Map<String, Value>,
    ctx: &str,
    warnings: &mut Vec<String>,
) -> Option<Severity> {
    match obj.get("severity") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let parsed = Severity::parse(s);
            if parsed.is_none() {
                warnings.push(format!("{ctx}: unrecognized 'severity'; left unset"));
            }
            parsed
        }
        Some(_) => {
            warnings.push(format!("{ctx}: 'severity' is not text; left unset"));
            None
        }
    }
}

fn triage_field(obj: &Map<String, Value>, ctx: &str, warnings: &mut Vec<String>) -> Triage {
    match obj.get("triage") {
        None | Some(Value::Null) => Triage::None,
        Some(Value::String(s)) => Triage::parse(s).unwrap_or_else(|| {
            warnings.push(format!("{ctx}: unrecognized 'triage'; folded to none"));
            Triage::None
        }),
        Some(_) => {
            warnings.push(format!("{ctx}: 'triage' is not text; folded to none"));
            Triage::None
        }
    }
}

/// Non-numeric confidence is treated as absent. Range is not enforced here.
fn confidence_field(obj: &Map<String, Value>, ctx: &str, warnings: &mut Vec<String>) -> Option<f64> {
    match obj.get("confidence") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => {
            warnings.push(format!("{ctx}: 'confidence' is not numeric; left unset"));
            None
        }
    }
}

fn measurements_field(
    obj: &Map<String, Value>,
    ctx: &str,
    warnings: &mut Vec<String>,
) -> BTreeMap<String, String> {
    let entries = match obj.get("measurements") {
        None | Some(Value::Null) => return BTreeMap::new(),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            warnings.push(format!("{ctx}: 'measurements' is not a mapping; defaulted to empty"));
            return BTreeMap::new();
        }
    };

    let mut out = BTreeMap::new();
    for (name, value) in entries {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                warnings.push(format!("{ctx}: dropped non-scalar measurement '{name}'"));
                continue;
            }
        };
        out.insert(name.clone(), text);
    }
    out
}

fn citations_field(
    obj: &Map<String, Value>,
    ctx: &str,
    warnings: &mut Vec<String>,
) -> Vec<Citation> {
    let items = match obj.get("citations") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warnings.push(format!("{ctx}: 'citations' is not a list; defaulted to empty"));
            return Vec::new();
        }
    };

    let mut citations = Vec::with_capacity(items.len());
    for (j, item) in items.iter().enumerate() {
        match item {
            Value::Object(c) => {
                let cctx = format!("{ctx} citation {j}");
                citations.push(Citation {
                    title: text_field(c, "title", &cctx, warnings),
                    url: optional_text(c, "url", &cctx, warnings),
                    doi: optional_text(c, "doi", &cctx, warnings),
                    year: year_field(c, &cctx, warnings),
                });
            }
            Value::String(title) if !title.trim().is_empty() => citations.push(Citation {
                title: title.clone(),
                ..Citation::default()
            }),
            _ => warnings.push(format!("{ctx}: dropped malformed citation {j}")),
        }
    }
    citations
}

/// Integer years, or digit strings like `"2021"`.
fn year_field(obj: &Map<String, Value>, ctx: &str, warnings: &mut Vec<String>) -> Option<i64> {
    match obj.get("year") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) if n.as_i64().is_some() => n.as_i64(),
        Some(Value::String(s)) if s.trim().parse::<i64>().is_ok() => s.trim().parse().ok(),
        Some(_) => {
            warnings.push(format!("{ctx}: 'year' is not an integer; left unset"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scan::types::BoundingBox;
    use serde_json::json;

    fn validate(value: Value) -> ValidatedRecord {
        validate_record(value.as_object().unwrap())
    }

    fn full_payload() -> Value {
        json!({
            "overall_summary": {
                "summary": "Focal opacity in the right lower lobe.",
                "triage": "Urgent",
                "next_steps": ["Chest CT", "Sputum culture"],
                "disclaimer": "Not a diagnosis."
            },
            "anomalies": [
                {
                    "name": "Right lower lobe opacity",
                    "likely_condition": "Pneumonia",
                    "severity": "moderate",
                    "confidence": 0.82,
                    "description": "Patchy consolidation.",
                    "measurements": {"size": "3.1 cm", "count": 2},
                    "explanation": "Consolidation pattern is typical of infection.",
                    "suggestion": "Start empiric antibiotics.",
                    "differentials": ["Atelectasis", "Mass"],
                    "citations": [
                        {"title": "IDSA CAP guideline", "url": "https://example.org/cap", "year": 2019},
                        "Fleischner glossary"
                    ],
                    "bbox": [120, 340, 260, 480],
                    "unknown_key": true
                }
            ],
            "model_version": "x"
        })
    }

    #[test]
    fn full_payload_maps_every_field() {
        let result = validate(full_payload());
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);

        let summary = result.record.overall_summary.as_ref().unwrap();
        assert_eq!(summary.triage, Triage::Urgent);
        assert_eq!(summary.next_steps.len(), 2);

        let finding = &result.record.anomalies[0];
        assert_eq!(finding.name, "Right lower lobe opacity");
        assert_eq!(finding.likely_condition.as_deref(), Some("Pneumonia"));
        assert_eq!(finding.severity, Some(Severity::Moderate));
        assert_eq!(finding.confidence, Some(0.82));
        assert_eq!(finding.measurements["size"], "3.1 cm");
        assert_eq!(finding.measurements["count"], "2");
        assert_eq!(finding.differentials, vec!["Atelectasis", "Mass"]);
        assert_eq!(finding.citations.len(), 2);
        assert_eq!(finding.citations[0].year, Some(2019));
        assert_eq!(finding.citations[1].title, "Fleischner glossary");
        assert_eq!(finding.boxes, vec![BoundingBox::new(120, 340, 260, 480)]);
    }

    #[test]
    fn missing_optional_fields_default_empty() {
        let result = validate(json!({"anomalies": [{}]}));
        assert!(result.warnings.is_empty());
        assert!(result.record.overall_summary.is_none());

        let finding = &result.record.anomalies[0];
        assert_eq!(finding, &Finding::default());
    }

    #[test]
    fn empty_anomalies_is_valid() {
        let result = validate(json!({"anomalies": []}));
        assert!(result.record.anomalies.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn non_object_findings_skipped() {
        let result = validate(json!({
            "anomalies": ["bad", {"name": "kept"}, 42, null, {"name": "also kept"}]
        }));
        let names: Vec<_> = result.record.anomalies.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["kept", "also kept"]);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn anomalies_wrong_type_degrades_to_empty() {
        let result = validate(json!({"anomalies": {"name": "x"}}));
        assert!(result.record.anomalies.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn unknown_enums_fold_to_neutral() {
        let result = validate(json!({
            "overall_summary": {"triage": "asap"},
            "anomalies": [{"severity": "catastrophic"}, {"severity": 3}, {"severity": " HIGH "}]
        }));
        assert_eq!(
            result.record.overall_summary.unwrap().triage,
            Triage::None
        );
        assert_eq!(result.record.anomalies[0].severity, None);
        assert_eq!(result.record.anomalies[1].severity, None);
        assert_eq!(result.record.anomalies[2].severity, Some(Severity::High));
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn non_numeric_confidence_is_absent() {
        let result = validate(json!({
            "anomalies": [{"confidence": "high"}, {"confidence": 1.7}, {"confidence": -0.2}]
        }));
        assert_eq!(result.record.anomalies[0].confidence, None);
        assert_eq!(result.record.anomalies[1].confidence, Some(1.7));
        assert_eq!(result.record.anomalies[1].display_confidence(), Some(1.0));
        assert_eq!(result.record.anomalies[2].display_confidence(), Some(0.0));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn wrong_typed_fields_repaired_not_rejected() {
        let result = validate(json!({
            "overall_summary": "all good",
            "anomalies": [{
                "name": 7,
                "likely_condition": "   ",
                "description": ["a"],
                "measurements": "n/a",
                "differentials": "Atelectasis",
                "next_steps": 1,
                "citations": [{"title": "T", "year": "2020"}, {"year": "soon"}, 5]
            }]
        }));
        assert!(result.record.overall_summary.is_none());

        let f = &result.record.anomalies[0];
        assert_eq!(f.name, "");
        assert_eq!(f.likely_condition, None);
        assert_eq!(f.description, "");
        assert!(f.measurements.is_empty());
        assert_eq!(f.differentials, vec!["Atelectasis"]);
        assert_eq!(f.citations.len(), 2);
        assert_eq!(f.citations[0].year, Some(2020));
        assert_eq!(f.citations[1].year, None);
        // summary, name, description, measurements, differentials, year, citation 2
        assert_eq!(result.warnings.len(), 7);
    }

    #[test]
    fn warnings_do_not_leak_content() {
        let result = validate(json!({
            "anomalies": [{"severity": "secret-patient-detail"}]
        }));
        assert!(result
            .warnings
            .iter()
            .all(|w| !w.contains("secret-patient-detail")));
    }

    #[test]
    fn metrics_fields_default_individually() {
        let value = json!({
            "temperature": "101.2°F",
            "heart_rate": 88,
            "blood_pressure": "130/85",
            "symptoms": null,
            "extra": "ignored"
        });
        let metrics = validate_metrics(value.as_object().unwrap());
        assert_eq!(metrics.temperature, "101.2°F");
        assert_eq!(metrics.heart_rate, "");
        assert_eq!(metrics.blood_pressure, "130/85");
        assert_eq!(metrics.symptoms, "");
        assert_eq!(metrics.weight, "");
    }
}

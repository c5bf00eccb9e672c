// Vital-metrics extraction from a report-reading model response.
// Same sanitize -> parse -> validate chain as the scan record, but it never
// fails: downstream display cannot tolerate blank temperature/weight/height,
// so those three are always filled with fixed defaults.

use serde_json::Value;

use super::parser::parse_payload;
use super::sanitize::isolate_payload;
use super::types::VitalMetrics;
use super::validation::validate_metrics;

pub const DEFAULT_TEMPERATURE: &str = "98.6°F";
pub const DEFAULT_WEIGHT: &str = "N/A";
pub const DEFAULT_HEIGHT: &str = "N/A";

impl VitalMetrics {
    /// Field names paired with their values, in declaration order.
    pub fn fields(&self) -> [(&'static str, &String); 10] {
        [
            ("temperature", &self.temperature),
            ("weight", &self.weight),
            ("height", &self.height),
            ("heart_rate", &self.heart_rate),
            ("blood_pressure", &self.blood_pressure),
            ("respiratory_rate", &self.respiratory_rate),
            ("oxygen_saturation", &self.oxygen_saturation),
            ("glucose_level", &self.glucose_level),
            ("cholesterol_level", &self.cholesterol_level),
            ("symptoms", &self.symptoms),
        ]
    }

    fn fields_mut(&mut self) -> [&mut String; 10] {
        [
            &mut self.temperature,
            &mut self.weight,
            &mut self.height,
            &mut self.heart_rate,
            &mut self.blood_pressure,
            &mut self.respiratory_rate,
            &mut self.oxygen_saturation,
            &mut self.glucose_level,
            &mut self.cholesterol_level,
            &mut self.symptoms,
        ]
    }

    /// Mandatory fields (temperature, weight, height) that are currently blank.
    pub fn missing_mandatory(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .take(3)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Extract metrics from raw model text. Always succeeds.
pub fn extract_metrics(raw: &str) -> VitalMetrics {
    extract_metrics_with_previous(raw, None)
}

/// Like `extract_metrics`, but blank fields are first filled from the
/// caller's previous metrics. No state is kept between calls.
pub fn extract_metrics_with_previous(raw: &str, previous: Option<&VitalMetrics>) -> VitalMetrics {
    let mut metrics = parse_metrics(raw);

    if let Some(prev) = previous {
        carry_over(&mut metrics, prev);
    }

    let repaired = repair_mandatory(&mut metrics);
    if !repaired.is_empty() {
        tracing::debug!(fields = ?repaired, "Mandatory vital metrics defaulted");
    }
    metrics
}

fn parse_metrics(raw: &str) -> VitalMetrics {
    let sanitized = isolate_payload(raw);
    match parse_payload(&sanitized) {
        Ok(Value::Object(obj)) => validate_metrics(&obj),
        Ok(_) => {
            tracing::warn!("Metrics payload is not an object, using defaults");
            VitalMetrics::default()
        }
        Err(e) => {
            tracing::warn!(
                stage = e.failed_at().as_str(),
                error = %e,
                "Metrics extraction failed, using defaults"
            );
            VitalMetrics::default()
        }
    }
}

fn carry_over(metrics: &mut VitalMetrics, previous: &VitalMetrics) {
    for (current, (_, prev)) in metrics.fields_mut().into_iter().zip(previous.fields()) {
        if current.trim().is_empty() && !prev.trim().is_empty() {
            *current = prev.clone();
        }
    }
}

/// Fill blank temperature/weight/height with their fixed defaults.
/// Returns the names of the fields that were filled.
pub fn repair_mandatory(metrics: &mut VitalMetrics) -> Vec<&'static str> {
    let missing = metrics.missing_mandatory();
    for name in &missing {
        match *name {
            "temperature" => metrics.temperature = DEFAULT_TEMPERATURE.to_string(),
            "weight" => metrics.weight = DEFAULT_WEIGHT.to_string(),
            "height" => metrics.height = DEFAULT_HEIGHT.to_string(),
            _ => {}
        }
    }
    missing
}

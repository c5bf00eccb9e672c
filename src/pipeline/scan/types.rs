use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

/// Validated diagnostic record reconstructed from a model response.
///
/// Built fresh per invocation by `validation::validate_record`; it never
/// outlives the call that produced it unless the caller keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DiagnosticRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_summary: Option<OverallSummary>,
    pub anomalies: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct OverallSummary {
    pub summary: String,
    pub triage: Triage,
    pub next_steps: Vec<String>,
    pub disclaimer: String,
}

/// Urgency attached to the overall summary. Unknown values fold to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Triage {
    #[default]
    None,
    Routine,
    Urgent,
    Emergency,
}

impl Triage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Routine => "routine",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }

    /// Case-insensitive lookup. Returns `None` for anything outside the enumeration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(Self::None),
            "routine" => Some(Self::Routine),
            "urgent" => Some(Self::Urgent),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" => Some(Self::Moderate),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// One detected anomaly with its supporting text and geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Finding {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Raw model value. Use `display_confidence` for the clamped view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub description: String,
    pub measurements: BTreeMap<String, String>,
    pub explanation: String,
    pub suggestion: String,
    pub differentials: Vec<String>,
    pub citations: Vec<Citation>,
    /// Serialized under the list key so a serialized record validates back
    /// into the same boxes.
    #[serde(rename = "bboxes")]
    pub boxes: Vec<BoundingBox>,
}

impl Finding {
    /// Confidence clamped into `[0, 1]`.
    pub fn display_confidence(&self) -> Option<f64> {
        self.confidence.map(|c| c.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Citation {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
}

/// Axis-aligned box in source-image pixels, as supplied by the model.
///
/// Ordering of the corners is not enforced; `x1 > x2` passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "[i64; 4]")]
pub struct BoundingBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl BoundingBox {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_inverted(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }
}

impl From<[i64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [i64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Patient vital metrics pulled out of a free-text report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct VitalMetrics {
    pub temperature: String,
    pub weight: String,
    pub height: String,
    pub heart_rate: String,
    pub blood_pressure: String,
    pub respiratory_rate: String,
    pub oxygen_saturation: String,
    pub glucose_level: String,
    pub cholesterol_level: String,
    pub symptoms: String,
}

/// Output of a successful scan analysis.
#[derive(Debug, Clone)]
pub struct ScanAnalysis {
    pub analysis_id: Uuid,
    pub record: DiagnosticRecord,
    /// Annotated image, PNG-encoded.
    pub annotated_png: Vec<u8>,
    /// Dimensions of the encoded image (after any display downscale).
    pub width: u32,
    pub height: u32,
    /// Field-level repairs applied while validating the payload.
    pub warnings: Vec<String>,
}

/// Runs the scan pipeline for one model response (allows mocking in hosts).
pub trait DiagnosticAnalyzer: Send + Sync {
    /// Validate `raw_text` and overlay its boxes on `image`.
    fn analyze(
        &self,
        raw_text: &str,
        image: &image::DynamicImage,
    ) -> Result<ScanAnalysis, super::AnalysisError>;

    /// Pull vital metrics out of a report response. Never fails.
    fn extract_metrics(&self, raw_text: &str, previous: Option<&VitalMetrics>) -> VitalMetrics;
}

use image::DynamicImage;
use tracing::debug;
use uuid::Uuid;

use super::metrics::extract_metrics_with_previous;
use super::parser::{parse_payload, require_key, ANOMALIES_KEY};
use super::render::{decode_image, downscale_to_width, encode_png, render_annotations};
use super::sanitize::isolate_payload;
use super::types::{DiagnosticAnalyzer, ScanAnalysis, VitalMetrics};
use super::validation::{validate_record, ValidatedRecord};
use super::{AnalysisError, Stage};
use crate::config::OverlayConfig;

/// Text half of the pipeline: sanitize -> parse -> require `anomalies` -> validate.
pub fn parse_diagnostic_record(raw_text: &str) -> Result<ValidatedRecord, AnalysisError> {
    let sanitized = isolate_payload(raw_text);
    debug!(
        stage = Stage::Sanitized.as_str(),
        raw_len = raw_text.len(),
        payload_len = sanitized.len(),
        "Model response sanitized"
    );

    let value = parse_payload(&sanitized)?;
    debug!(stage = Stage::Parsed.as_str(), "Payload parsed");

    let root = require_key(&value, ANOMALIES_KEY)?;
    let validated = validate_record(root);
    debug!(
        stage = Stage::Validated.as_str(),
        findings = validated.record.anomalies.len(),
        repairs = validated.warnings.len(),
        "Payload validated"
    );

    Ok(validated)
}

/// Full scan pipeline: validated record plus annotated, display-sized PNG.
///
/// sanitize -> parse -> validate -> normalize boxes -> draw -> downscale -> encode
pub struct ScanAnalyzer {
    config: OverlayConfig,
}

impl Default for ScanAnalyzer {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

impl ScanAnalyzer {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    /// Analyzer configured from the environment (`MEDISCAN_MAX_DISPLAY_WIDTH`).
    pub fn from_env() -> Self {
        Self::new(OverlayConfig::from_env())
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Decode the uploaded scan first, then run `analyze`.
    pub fn analyze_bytes(
        &self,
        raw_text: &str,
        image_bytes: &[u8],
    ) -> Result<ScanAnalysis, AnalysisError> {
        let image = decode_image(image_bytes)?;
        self.analyze(raw_text, &image)
    }
}

impl DiagnosticAnalyzer for ScanAnalyzer {
    fn analyze(&self, raw_text: &str, image: &DynamicImage) -> Result<ScanAnalysis, AnalysisError> {
        let analysis_id = Uuid::new_v4();
        let _span = tracing::info_span!("analyze_scan", analysis_id = %analysis_id).entered();

        let ValidatedRecord { record, warnings } = match parse_diagnostic_record(raw_text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    failed_at = e.failed_at().as_str(),
                    error = %e,
                    "Scan analysis failed"
                );
                return Err(e);
            }
        };

        let box_count: usize = record.anomalies.iter().map(|f| f.boxes.len()).sum();
        debug!(
            stage = Stage::Normalized.as_str(),
            boxes = box_count,
            "Geometry normalized"
        );

        let annotated = render_annotations(image, &record.anomalies, &self.config);
        let annotated = downscale_to_width(annotated, self.config.max_display_width);
        let (width, height) = annotated.dimensions();
        let annotated_png = encode_png(annotated)?;

        tracing::info!(
            stage = Stage::Rendered.as_str(),
            findings = record.anomalies.len(),
            boxes = box_count,
            repairs = warnings.len(),
            png_size = annotated_png.len(),
            "Scan analysis complete"
        );

        Ok(ScanAnalysis {
            analysis_id,
            record,
            annotated_png,
            width,
            height,
            warnings,
        })
    }

    fn extract_metrics(&self, raw_text: &str, previous: Option<&VitalMetrics>) -> VitalMetrics {
        extract_metrics_with_previous(raw_text, previous)
    }
}

/// One-shot entry point with default styling.
pub fn analyze_scan(
    raw_text: &str,
    image: &DynamicImage,
    max_display_width: u32,
) -> Result<ScanAnalysis, AnalysisError> {
    ScanAnalyzer::new(OverlayConfig::default().with_max_display_width(max_display_width))
        .analyze(raw_text, image)
}

/// Like `analyze_scan`, decoding the scan from encoded bytes (PNG/JPEG).
pub fn analyze_scan_bytes(
    raw_text: &str,
    image_bytes: &[u8],
    max_display_width: u32,
) -> Result<ScanAnalysis, AnalysisError> {
    ScanAnalyzer::new(OverlayConfig::default().with_max_display_width(max_display_width))
        .analyze_bytes(raw_text, image_bytes)
}

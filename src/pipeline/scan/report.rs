use std::fmt::Write;

use super::types::{DiagnosticRecord, Finding, OverallSummary, Triage};

/// Shown when the record carries no findings.
pub const NO_ANOMALIES_MESSAGE: &str =
    "No anomalies detected in the body scan based on the analysis.";

/// Confidence as a clamped whole percentage, e.g. `1.7` -> `"100%"`.
pub fn display_confidence(confidence: Option<f64>) -> Option<String> {
    confidence.map(|c| format!("{:.0}%", c.clamp(0.0, 1.0) * 100.0))
}

/// `index` is zero-based; titles are numbered from 1.
pub fn finding_title(index: usize, finding: &Finding) -> String {
    let name = finding.name.trim();
    let name = if name.is_empty() { "Unnamed" } else { name };
    format!("Anomaly {}: {name}", index + 1)
}

fn or_na(text: &str) -> &str {
    if text.trim().is_empty() {
        "N/A"
    } else {
        text
    }
}

/// Plain Markdown report of a validated record.
pub fn render_markdown(record: &DiagnosticRecord) -> String {
    let mut out = String::new();

    if let Some(summary) = &record.overall_summary {
        write_summary(&mut out, summary);
    }

    if record.anomalies.is_empty() {
        out.push_str(NO_ANOMALIES_MESSAGE);
        out.push('\n');
        return out;
    }

    for (i, finding) in record.anomalies.iter().enumerate() {
        write_finding(&mut out, i, finding);
    }
    out
}

fn write_summary(out: &mut String, summary: &OverallSummary) {
    let _ = writeln!(out, "## Overall Summary\n");
    let _ = writeln!(out, "{}\n", or_na(&summary.summary));
    if summary.triage != Triage::None {
        let _ = writeln!(out, "**Triage:** {}\n", summary.triage.as_str());
    }
    if !summary.next_steps.is_empty() {
        let _ = writeln!(out, "**Next steps**");
        for step in &summary.next_steps {
            let _ = writeln!(out, "- {step}");
        }
        out.push('\n');
    }
    if !summary.disclaimer.trim().is_empty() {
        let _ = writeln!(out, "_{}_\n", summary.disclaimer.trim());
    }
}

fn write_finding(out: &mut String, index: usize, finding: &Finding) {
    let _ = writeln!(out, "## {}\n", finding_title(index, finding));

    let mut facts = Vec::new();
    if let Some(condition) = &finding.likely_condition {
        facts.push(format!("Likely condition: {condition}"));
    }
    if let Some(severity) = finding.severity {
        facts.push(format!("Severity: {}", severity.as_str()));
    }
    if let Some(confidence) = display_confidence(finding.confidence) {
        facts.push(format!("Confidence: {confidence}"));
    }
    if !facts.is_empty() {
        let _ = writeln!(out, "{}\n", facts.join(" | "));
    }

    let _ = writeln!(out, "**Description**\n\n{}\n", or_na(&finding.description));
    let _ = writeln!(
        out,
        "**Research-Backed Explanation**\n\n{}\n",
        or_na(&finding.explanation)
    );
    let _ = writeln!(out, "**Suggestions**\n\n{}\n", or_na(&finding.suggestion));

    if !finding.measurements.is_empty() {
        let _ = writeln!(out, "**Measurements**");
        for (name, value) in &finding.measurements {
            let _ = writeln!(out, "- {name}: {value}");
        }
        out.push('\n');
    }

    if !finding.differentials.is_empty() {
        let _ = writeln!(out, "**Differentials:** {}\n", finding.differentials.join(", "));
    }

    if !finding.citations.is_empty() {
        let _ = writeln!(out, "**Citations**");
        for c in &finding.citations {
            let mut line = format!("- {}", or_na(&c.title));
            if let Some(year) = c.year {
                let _ = write!(line, " ({year})");
            }
            if let Some(doi) = &c.doi {
                let _ = write!(line, " doi:{doi}");
            }
            if let Some(url) = &c.url {
                let _ = write!(line, " <{url}>");
            }
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scan::types::{Citation, Severity};

    #[test]
    fn confidence_clamped_for_display() {
        assert_eq!(display_confidence(Some(1.7)).as_deref(), Some("100%"));
        assert_eq!(display_confidence(Some(-0.2)).as_deref(), Some("0%"));
        assert_eq!(display_confidence(Some(0.82)).as_deref(), Some("82%"));
        assert_eq!(display_confidence(None), None);
    }

    #[test]
    fn unnamed_finding_gets_fallback_title() {
        let finding = Finding::default();
        assert_eq!(finding_title(0, &finding), "Anomaly 1: Unnamed");

        let named = Finding {
            name: " Nodule ".into(),
            ..Finding::default()
        };
        assert_eq!(finding_title(2, &named), "Anomaly 3: Nodule");
    }

    #[test]
    fn empty_record_reports_no_anomalies() {
        let md = render_markdown(&DiagnosticRecord::default());
        assert_eq!(md.trim(), NO_ANOMALIES_MESSAGE);
    }

    #[test]
    fn finding_sections_rendered_with_fallbacks() {
        let record = DiagnosticRecord {
            overall_summary: Some(OverallSummary {
                summary: "One finding.".into(),
                triage: Triage::Routine,
                next_steps: vec!["Follow-up X-ray".into()],
                disclaimer: String::new(),
            }),
            anomalies: vec![Finding {
                name: "Nodule".into(),
                severity: Some(Severity::Low),
                confidence: Some(1.2),
                description: "Small round opacity.".into(),
                citations: vec![Citation {
                    title: "Fleischner 2017".into(),
                    year: Some(2017),
                    ..Citation::default()
                }],
                ..Finding::default()
            }],
        };

        let md = render_markdown(&record);
        assert!(md.contains("**Triage:** routine"));
        assert!(md.contains("- Follow-up X-ray"));
        assert!(md.contains("## Anomaly 1: Nodule"));
        assert!(md.contains("Severity: low | Confidence: 100%"));
        assert!(md.contains("Small round opacity."));
        assert!(md.contains("**Suggestions**\n\nN/A"));
        assert!(md.contains("- Fleischner 2017 (2017)"));
        assert!(!md.contains(NO_ANOMALIES_MESSAGE));
    }
}

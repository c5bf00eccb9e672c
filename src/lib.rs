pub mod config;
pub mod pipeline;

pub use pipeline::scan::{
    analyze_scan, analyze_scan_bytes, extract_metrics, extract_metrics_with_previous,
    parse_diagnostic_record, AnalysisError, DiagnosticAnalyzer, DiagnosticRecord, ScanAnalysis,
    ScanAnalyzer, VitalMetrics,
};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber for a host process.
///
/// Filter comes from `RUST_LOG`, falling back to `config::default_log_filter()`.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_tracing();
        assert!(!init_tracing());
    }
}

use serde_json::{Map, Value};

use super::AnalysisError;

/// Key the diagnostic payload cannot be used without.
pub const ANOMALIES_KEY: &str = "anomalies";

/// Parse sanitized text into a generic JSON tree.
///
/// Whitespace-only input is `EmptyPayload`, kept apart from syntax errors
/// because it usually means the model refused to answer.
pub fn parse_payload(sanitized: &str) -> Result<Value, AnalysisError> {
    if sanitized.trim().is_empty() {
        return Err(AnalysisError::EmptyPayload);
    }

    serde_json::from_str(sanitized).map_err(|e| AnalysisError::MalformedPayload {
        detail: e.to_string(),
        line: e.line(),
        column: e.column(),
    })
}

/// Require the top level to be an object carrying `key`.
pub fn require_key<'a>(
    value: &'a Value,
    key: &str,
) -> Result<&'a Map<String, Value>, AnalysisError> {
    value
        .as_object()
        .filter(|obj| obj.contains_key(key))
        .ok_or_else(|| AnalysisError::SchemaMissingKey {
            key: key.to_string(),
        })
}

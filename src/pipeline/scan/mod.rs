pub mod types;
pub mod sanitize;
pub mod parser;
pub mod validation;
pub mod geometry;
pub mod render;
pub mod metrics;
pub mod report;
pub mod orchestrator;

pub use types::*;
pub use sanitize::*;
pub use parser::*;
pub use validation::*;
pub use geometry::*;
pub use render::*;
pub use metrics::*;
pub use report::*;
pub use orchestrator::*;

use thiserror::Error;

/// Per-invocation pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Sanitized,
    Parsed,
    Validated,
    Normalized,
    Rendered,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Sanitized => "sanitized",
            Self::Parsed => "parsed",
            Self::Validated => "validated",
            Self::Normalized => "normalized",
            Self::Rendered => "rendered",
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Usually an upstream content-policy block rather than a formatting bug.
    #[error("Model response contained no payload")]
    EmptyPayload,

    #[error("Malformed model payload at line {line}, column {column}: {detail}")]
    MalformedPayload {
        detail: String,
        line: usize,
        column: usize,
    },

    #[error("Model payload is missing required key '{key}'")]
    SchemaMissingKey { key: String },

    #[error("Image processing error: {0}")]
    Image(String),
}

impl AnalysisError {
    /// The state the invocation was in when it terminated.
    pub fn failed_at(&self) -> Stage {
        match self {
            Self::EmptyPayload | Self::MalformedPayload { .. } => Stage::Parsed,
            Self::SchemaMissingKey { .. } => Stage::Validated,
            Self::Image(_) => Stage::Rendered,
        }
    }
}

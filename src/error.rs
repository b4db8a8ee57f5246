//! Error kinds surfaced by the simplification engine.
//!
//! Per the error-handling policy: only malformed I/O and internal invariant
//! violations are fatal. Everything else the driver's hot loop can recover
//! from is handled inline (dropping an edge, skipping a candidate) and never
//! constructs one of these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimplifyError {
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    #[error("unknown mesh file format for extension {extension:?}")]
    UnknownFormat { extension: Option<String> },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("edge ({0}, {1}) not found in priority queue")]
    EdgeNotFound(usize, usize),

    #[error("target vertex count unreachable; achieved {achieved} (queue drained)")]
    UnreachableTarget { achieved: usize },
}

pub type Result<T> = std::result::Result<T, SimplifyError>;

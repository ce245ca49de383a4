//! Error types for plan_stream.
//!
//! All errors that can occur while transforming, compiling, or executing a
//! plan are represented by [`PlanStreamError`]. Errors are propagated via
//! `Result<T, PlanStreamError>` and handed to the external driver unchanged
//! in kind; nothing inside the core catches and ignores them.
//!
//! # Error Classification
//!
//! - **Compilation**: unknown aggregate or function, bad plan shape,
//!   unresolvable source. Fatal to the whole compile.
//! - **Evaluation**: an expression failed against a specific record.
//!   Aborts the pull that hit it.
//! - **Retraction**: an undo reached state that was never incorporated.
//!   Signals an upstream bookkeeping bug.
//! - **Value**: an aggregate has no contributing values. Reported to the
//!   consumer as a value, never as a pipeline failure.
//! - **Io**: a sink write failed or was short.
//! - **Cancelled**, **Config**, **Internal**.
//!
//! # Context
//!
//! [`PlanStreamError::context`] prefixes an identifying message (node kind,
//! key or field index) while keeping the variant, so classification
//! survives every component boundary the error crosses.

use std::fmt;

/// Primary error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum PlanStreamError {
    // ── Compile-time errors ──────────────────────────────────────────────
    /// The plan could not be compiled into an operator tree.
    #[error("compilation error: {0}")]
    Compilation(String),

    // ── Run-time errors ──────────────────────────────────────────────────
    /// An expression could not be evaluated against a record.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// An undo was applied to state that was never incorporated.
    #[error("inconsistent retraction: {0}")]
    InconsistentRetraction(String),

    /// An aggregate was read while it had no contributing values.
    #[error("empty aggregate: {0}")]
    EmptyAggregate(String),

    /// Writing to the output failed.
    #[error("sink I/O error: {context}: {source}")]
    SinkIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The external cancellation signal fired.
    #[error("cancelled: {0}")]
    Cancelled(String),

    // ── Setup errors ─────────────────────────────────────────────────────
    /// The engine configuration is malformed or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Internal errors ────────────────────────────────────────────────────
    /// An unexpected internal error. Indicates a bug.
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Classification of error kind for drivers and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStreamErrorKind {
    Compilation,
    Evaluation,
    Retraction,
    Value,
    Io,
    Cancelled,
    Config,
    Internal,
}

impl fmt::Display for PlanStreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStreamErrorKind::Compilation => write!(f, "COMPILATION"),
            PlanStreamErrorKind::Evaluation => write!(f, "EVALUATION"),
            PlanStreamErrorKind::Retraction => write!(f, "RETRACTION"),
            PlanStreamErrorKind::Value => write!(f, "VALUE"),
            PlanStreamErrorKind::Io => write!(f, "IO"),
            PlanStreamErrorKind::Cancelled => write!(f, "CANCELLED"),
            PlanStreamErrorKind::Config => write!(f, "CONFIG"),
            PlanStreamErrorKind::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl PlanStreamError {
    /// Build a short-write error for a sink delimiter or payload.
    pub fn short_write(context: impl Into<String>) -> Self {
        PlanStreamError::SinkIo {
            context: context.into(),
            source: std::io::Error::from(std::io::ErrorKind::WriteZero),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> PlanStreamErrorKind {
        match self {
            PlanStreamError::Compilation(_) => PlanStreamErrorKind::Compilation,
            PlanStreamError::Evaluation(_) => PlanStreamErrorKind::Evaluation,
            PlanStreamError::InconsistentRetraction(_) => PlanStreamErrorKind::Retraction,
            PlanStreamError::EmptyAggregate(_) => PlanStreamErrorKind::Value,
            PlanStreamError::SinkIo { .. } => PlanStreamErrorKind::Io,
            PlanStreamError::Cancelled(_) => PlanStreamErrorKind::Cancelled,
            PlanStreamError::InvalidConfig(_) => PlanStreamErrorKind::Config,
            PlanStreamError::InternalError(_) => PlanStreamErrorKind::Internal,
        }
    }

    /// Whether the error ends the pipeline.
    ///
    /// Only empty aggregates are value-level; every other error aborts the
    /// pull or the compile that produced it.
    pub fn is_fatal(&self) -> bool {
        !self.is_value_level()
    }

    /// Whether the error is reported to the consumer as a value.
    pub fn is_value_level(&self) -> bool {
        matches!(self, PlanStreamError::EmptyAggregate(_))
    }

    /// Prefix identifying context, keeping the variant.
    pub fn context(self, ctx: impl fmt::Display) -> Self {
        match self {
            PlanStreamError::Compilation(m) => PlanStreamError::Compilation(format!("{ctx}: {m}")),
            PlanStreamError::Evaluation(m) => PlanStreamError::Evaluation(format!("{ctx}: {m}")),
            PlanStreamError::InconsistentRetraction(m) => {
                PlanStreamError::InconsistentRetraction(format!("{ctx}: {m}"))
            }
            PlanStreamError::EmptyAggregate(m) => {
                PlanStreamError::EmptyAggregate(format!("{ctx}: {m}"))
            }
            PlanStreamError::SinkIo { context, source } => PlanStreamError::SinkIo {
                context: format!("{ctx}: {context}"),
                source,
            },
            PlanStreamError::Cancelled(m) => PlanStreamError::Cancelled(format!("{ctx}: {m}")),
            PlanStreamError::InvalidConfig(m) => {
                PlanStreamError::InvalidConfig(format!("{ctx}: {m}"))
            }
            PlanStreamError::InternalError(m) => {
                PlanStreamError::InternalError(format!("{ctx}: {m}"))
            }
        }
    }
}

//! Execution operators, the compiled, runnable form of a physical plan.
//!
//! Every operator is a pull-based stream stage. A call to
//! [`Operator::next`] may itself pull (and block) on the operator's sources;
//! no operator spawns tasks or buffers beyond its own state. `Ok(None)`
//! marks the end of the stream.
//!
//! # Submodules
//! - `expression`: executable expressions and the function table
//! - `aggregates`: accumulators and the aggregate prototype registry
//! - `group_by`: the streaming grouped-aggregation operator
//! - `scan`, `filter`, `map`, `union_all`: companion operators

pub mod aggregates;
pub mod expression;
pub mod filter;
pub mod group_by;
pub mod map;
pub mod scan;
pub mod union_all;

pub use expression::Expression;
pub use group_by::GroupBy;

use crate::error::PlanStreamError;
use crate::record::Record;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A runnable stream stage.
pub trait Operator {
    /// Produce the next record, `None` at end of stream.
    fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError>;
}

/// External cancellation signal. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-pull context threaded through every operator.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        ExecutionContext { cancellation }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail with `Cancelled` once the signal has fired.
    pub fn check_cancelled(&self, operator: &str) -> Result<(), PlanStreamError> {
        if self.cancellation.is_cancelled() {
            return Err(PlanStreamError::Cancelled(format!(
                "{operator} stopped pulling"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_shared_between_clones() {
        let token = CancellationToken::new();
        let ctx = ExecutionContext::new(token.clone());
        assert!(ctx.check_cancelled("scan").is_ok());
        token.cancel();
        let err = ctx.check_cancelled("scan").unwrap_err();
        assert!(matches!(err, PlanStreamError::Cancelled(_)));
    }
}

//! Filter: passes records whose predicate is exactly `true`.
//!
//! `false`, `NULL` and non-boolean results all drop the record.

use super::{ExecutionContext, Expression, Operator};
use crate::error::PlanStreamError;
use crate::record::Record;
use crate::value::Value;

pub struct Filter {
    source: Box<dyn Operator>,
    predicate: Expression,
}

impl Filter {
    pub fn new(source: Box<dyn Operator>, predicate: Expression) -> Self {
        Filter { source, predicate }
    }
}

impl Operator for Filter {
    fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        loop {
            ctx.check_cancelled("filter")?;
            let Some(record) = self.source.next(ctx)? else {
                return Ok(None);
            };
            let verdict = self
                .predicate
                .evaluate(&record)
                .map_err(|e| e.context("couldn't evaluate filter predicate"))?;
            if verdict == Value::Bool(true) {
                return Ok(Some(record));
            }
            tracing::trace!(record = %record, "filtered out");
        }
    }
}

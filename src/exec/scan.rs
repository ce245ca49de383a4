//! Scan: the execution side of a named data source.

use super::{ExecutionContext, Operator};
use crate::error::PlanStreamError;
use crate::record::Record;

pub struct Scan {
    name: String,
    inner: Box<dyn Operator>,
    pulled: u64,
}

impl Scan {
    pub fn new(name: impl Into<String>, inner: Box<dyn Operator>) -> Self {
        Scan {
            name: name.into(),
            inner,
            pulled: 0,
        }
    }
}

impl Operator for Scan {
    fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        ctx.check_cancelled("scan")?;
        let next = self
            .inner
            .next(ctx)
            .map_err(|e| e.context(format_args!("couldn't read from source {}", self.name)))?;
        match &next {
            Some(_) => self.pulled += 1,
            None => tracing::debug!(source = %self.name, records = self.pulled, "source exhausted"),
        }
        Ok(next)
    }
}

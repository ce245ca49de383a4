//! AVG accumulator, built on the running [`Sum`].

use super::Accumulator;
use super::sum::Sum;
use crate::error::PlanStreamError;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Avg {
    sum: Sum,
}

impl Accumulator for Avg {
    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.sum.incorporate(value)
    }

    fn check_incorporate(&self, value: &Value) -> Result<(), PlanStreamError> {
        self.sum.check_incorporate(value)
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        self.sum.check_undo(value)
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.sum.undo(value)
    }

    fn current(&self) -> Result<Value, PlanStreamError> {
        let n = self.sum.count();
        if n == 0 {
            return Err(PlanStreamError::EmptyAggregate(
                "avg over no values".into(),
            ));
        }
        Ok(Value::Float(self.sum.total_f64() / n as f64))
    }
}

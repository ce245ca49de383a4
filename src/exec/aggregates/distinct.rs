//! DISTINCT adapter.
//!
//! Tracks the multiplicity of every live value and forwards to the inner
//! accumulator only on the 0 → 1 and 1 → 0 transitions, so the inner
//! aggregate sees each distinct value exactly once.

use super::Accumulator;
use super::live::LiveValues;
use crate::error::PlanStreamError;
use crate::value::Value;

#[derive(Debug)]
pub struct Distinct {
    live: LiveValues,
    inner: Box<dyn Accumulator>,
}

impl Distinct {
    pub fn new(inner: Box<dyn Accumulator>) -> Self {
        Distinct {
            live: LiveValues::default(),
            inner,
        }
    }
}

impl Accumulator for Distinct {
    fn check_incorporate(&self, value: &Value) -> Result<(), PlanStreamError> {
        match self.live.multiplicity(value) {
            0 => self.inner.check_incorporate(value),
            _ => Ok(()),
        }
    }

    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        if self.live.multiplicity(value) == 0 {
            // Inner first: a failure must leave the multiplicity untouched.
            self.inner.incorporate(value)?;
        }
        self.live.insert(value);
        Ok(())
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        match self.live.multiplicity(value) {
            0 => Err(PlanStreamError::InconsistentRetraction(format!(
                "distinct value {value} was never incorporated"
            ))),
            1 => self.inner.check_undo(value),
            _ => Ok(()),
        }
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.check_undo(value)?;
        if self.live.multiplicity(value) == 1 {
            self.inner.undo(value)?;
        }
        self.live.remove(value);
        Ok(())
    }

    fn current(&self) -> Result<Value, PlanStreamError> {
        self.inner.current()
    }
}

//! MIN / MAX accumulators.
//!
//! Two strategies, selected by `extremum_strategy`:
//!
//! - [`OrderedExtremum`] keeps a sorted multiset of live values. Every
//!   operation is `O(log n)`.
//! - [`RescanExtremum`] keeps an unordered list plus the cached extremum.
//!   Incorporation is `O(1)`; retracting the current extremum rescans the
//!   list. Cheaper when retractions are rare.

use super::Accumulator;
use crate::config::ExtremumStrategy;
use crate::error::PlanStreamError;
use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn name(self) -> &'static str {
        match self {
            Extremum::Min => "min",
            Extremum::Max => "max",
        }
    }

    /// Whether `candidate` should replace `current`.
    fn prefers(self, candidate: &Value, current: &Value) -> bool {
        match self {
            Extremum::Min => candidate < current,
            Extremum::Max => candidate > current,
        }
    }

    fn empty(self) -> PlanStreamError {
        PlanStreamError::EmptyAggregate(format!("{} over no values", self.name()))
    }

    fn missing(self, value: &Value) -> PlanStreamError {
        PlanStreamError::InconsistentRetraction(format!(
            "{} never saw value {value}",
            self.name()
        ))
    }
}

pub fn new_extremum(which: Extremum, strategy: ExtremumStrategy) -> Box<dyn Accumulator> {
    match strategy {
        ExtremumStrategy::Ordered => Box::new(OrderedExtremum::new(which)),
        ExtremumStrategy::Rescan => Box::new(RescanExtremum::new(which)),
    }
}

// ── Ordered multiset ───────────────────────────────────────────────────

#[derive(Debug)]
pub struct OrderedExtremum {
    which: Extremum,
    values: BTreeMap<Value, usize>,
}

impl OrderedExtremum {
    pub fn new(which: Extremum) -> Self {
        OrderedExtremum {
            which,
            values: BTreeMap::new(),
        }
    }
}

impl Accumulator for OrderedExtremum {
    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        *self.values.entry(value.clone()).or_insert(0) += 1;
        Ok(())
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        if self.values.contains_key(value) {
            Ok(())
        } else {
            Err(self.which.missing(value))
        }
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        let Some(n) = self.values.get_mut(value) else {
            return Err(self.which.missing(value));
        };
        *n -= 1;
        if *n == 0 {
            self.values.remove(value);
        }
        Ok(())
    }

    fn current(&self) -> Result<Value, PlanStreamError> {
        let entry = match self.which {
            Extremum::Min => self.values.first_key_value(),
            Extremum::Max => self.values.last_key_value(),
        };
        entry
            .map(|(v, _)| v.clone())
            .ok_or_else(|| self.which.empty())
    }
}

// ── Rescan ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RescanExtremum {
    which: Extremum,
    values: Vec<Value>,
    best: Option<Value>,
}

impl RescanExtremum {
    pub fn new(which: Extremum) -> Self {
        RescanExtremum {
            which,
            values: Vec::new(),
            best: None,
        }
    }

    fn rescan(&mut self) {
        let which = self.which;
        self.best = self
            .values
            .iter()
            .fold(None::<&Value>, |best, v| match best {
                Some(b) if !which.prefers(v, b) => Some(b),
                _ => Some(v),
            })
            .cloned();
    }
}

impl Accumulator for RescanExtremum {
    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        let replace = match &self.best {
            Some(best) => self.which.prefers(value, best),
            None => true,
        };
        if replace {
            self.best = Some(value.clone());
        }
        self.values.push(value.clone());
        Ok(())
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        if self.values.contains(value) {
            Ok(())
        } else {
            Err(self.which.missing(value))
        }
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        let Some(pos) = self.values.iter().position(|v| v == value) else {
            return Err(self.which.missing(value));
        };
        self.values.swap_remove(pos);
        if self.best.as_ref() == Some(value) {
            self.rescan();
        }
        Ok(())
    }

    fn current(&self) -> Result<Value, PlanStreamError> {
        self.best.clone().ok_or_else(|| self.which.empty())
    }
}

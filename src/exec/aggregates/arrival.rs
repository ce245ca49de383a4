//! FIRST / LAST accumulators.
//!
//! Values are remembered in arrival order. A retraction withdraws the
//! oldest live occurrence of the retracted value, so FIRST and LAST stay
//! well-defined when duplicates come and go.

use super::Accumulator;
use crate::error::PlanStreamError;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    First,
    Last,
}

#[derive(Debug)]
pub struct ArrivalOrder {
    end: End,
    next_seq: u64,
    /// Live values keyed by arrival sequence.
    by_seq: BTreeMap<u64, Value>,
    /// Arrival sequences of each live value, oldest first.
    occurrences: HashMap<Value, VecDeque<u64>>,
}

impl ArrivalOrder {
    pub fn new(end: End) -> Self {
        ArrivalOrder {
            end,
            next_seq: 0,
            by_seq: BTreeMap::new(),
            occurrences: HashMap::new(),
        }
    }

    fn name(&self) -> &'static str {
        match self.end {
            End::First => "first",
            End::Last => "last",
        }
    }
}

impl Accumulator for ArrivalOrder {
    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_seq.insert(seq, value.clone());
        self.occurrences
            .entry(value.clone())
            .or_default()
            .push_back(seq);
        Ok(())
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        if self.occurrences.contains_key(value) {
            return Ok(());
        }
        Err(PlanStreamError::InconsistentRetraction(format!(
            "{} never saw value {value}",
            self.name()
        )))
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.check_undo(value)?;
        let Some(seqs) = self.occurrences.get_mut(value) else {
            return Ok(());
        };
        if let Some(seq) = seqs.pop_front() {
            self.by_seq.remove(&seq);
        }
        if seqs.is_empty() {
            self.occurrences.remove(value);
        }
        Ok(())
    }

    fn current(&self) -> Result<Value, PlanStreamError> {
        let entry = match self.end {
            End::First => self.by_seq.first_key_value(),
            End::Last => self.by_seq.last_key_value(),
        };
        entry.map(|(_, v)| v.clone()).ok_or_else(|| {
            PlanStreamError::EmptyAggregate(format!("{} over no values", self.name()))
        })
    }
}

//! Streaming grouped aggregation.
//!
//! The operator pulls records from its source, routes each one to the
//! accumulator set of its key and, in changelog mode, re-emits the group's
//! updated row with the triggering record's event kind. A retraction
//! therefore re-emits the aggregate *after* the undo. That changelog is
//! not a valid input for another group by: its retracted rows carry values
//! that were never inserted downstream.
//!
//! ```text
//!   Open ──(source exhausted)──▶ Draining ──(all rows out)──▶ Closed
//!     │
//!     └──(any error)──▶ Failed
//! ```
//!
//! In final mode nothing is emitted while `Open`; `Draining` emits one
//! `Insert` per group that still has live contributions, in the order the
//! groups were first seen.
//!
//! Every update is all-or-nothing: cancellation is checked, the key and all
//! field values are evaluated, and every accumulator is checked with
//! `check_incorporate` / `check_undo` before any of them is mutated. A new
//! group enters the table only once its first update succeeded. Any error
//! still poisons the operator.

use super::aggregates::{Accumulator, AggregatePrototype};
use super::{ExecutionContext, Expression, Operator};
use crate::config::EmitMode;
use crate::error::PlanStreamError;
use crate::record::{EventKind, Record};
use crate::value::{Value, VariableName};
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3Builder;

/// The evaluated key tuple of one group.
pub type GroupKey = Vec<Value>;

/// Value fed to accumulators for the `*` field.
const STAR: Value = Value::Bool(true);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupByState {
    Open,
    Draining,
    Closed,
    Failed,
}

// ── Group table ────────────────────────────────────────────────────────

#[derive(Debug)]
struct GroupState {
    key: GroupKey,
    accumulators: Vec<Box<dyn Accumulator>>,
    /// Inserts minus retractions seen for this key.
    live: u64,
}

impl GroupState {
    fn new(key: GroupKey, prototypes: &[AggregatePrototype]) -> Self {
        GroupState {
            key,
            accumulators: prototypes.iter().map(|p| p.new_accumulator()).collect(),
            live: 0,
        }
    }

    /// Feed one record's field values to every accumulator.
    ///
    /// All accumulators are checked before any is mutated, so on error the
    /// group is exactly as it was.
    fn update(
        &mut self,
        kind: EventKind,
        values: &[Value],
        prototypes: &[AggregatePrototype],
    ) -> Result<(), PlanStreamError> {
        if kind.is_retraction() && self.live == 0 {
            return Err(PlanStreamError::InconsistentRetraction(format!(
                "retraction for group {:?} with no live records",
                self.key
            )));
        }
        let field_error = |i: usize, e: PlanStreamError| {
            e.context(format_args!(
                "couldn't update {} for aggregated field with index {i}",
                prototypes[i].kind()
            ))
        };

        for (i, (acc, value)) in self.accumulators.iter().zip(values).enumerate() {
            if value.is_null() {
                continue;
            }
            let checked = match kind {
                EventKind::Insert => acc.check_incorporate(value),
                EventKind::Retract => acc.check_undo(value),
            };
            checked.map_err(|e| field_error(i, e))?;
        }
        for (i, (acc, value)) in self.accumulators.iter_mut().zip(values).enumerate() {
            if value.is_null() {
                continue;
            }
            let result = match kind {
                EventKind::Insert => acc.incorporate(value),
                EventKind::Retract => acc.undo(value),
            };
            result.map_err(|e| field_error(i, e))?;
        }
        match kind {
            EventKind::Insert => self.live += 1,
            EventKind::Retract => self.live -= 1,
        }
        Ok(())
    }
}

/// Arena of groups plus a hash index over their keys.
///
/// Groups are never removed while the stream is open, so arena order is
/// first-seen order.
#[derive(Debug)]
struct GroupTable {
    groups: Vec<GroupState>,
    index: HashMap<GroupKey, usize, Xxh3Builder>,
}

impl GroupTable {
    fn with_capacity(capacity: usize) -> Self {
        GroupTable {
            groups: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, Xxh3Builder::new()),
        }
    }

    fn find(&self, key: &GroupKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn insert(&mut self, group: GroupState) -> usize {
        let slot = self.groups.len();
        self.index.insert(group.key.clone(), slot);
        self.groups.push(group);
        slot
    }

    fn len(&self) -> usize {
        self.groups.len()
    }
}

// ── Operator ───────────────────────────────────────────────────────────

/// Everything the operator needs besides its source, positionally aligned:
/// `fields[i]` is fed to `aggregates[i]` and emitted as `output_names[i]`.
#[derive(Debug, Clone)]
pub struct GroupBySpec {
    pub key: Vec<Expression>,
    pub key_names: Vec<VariableName>,
    pub fields: Vec<VariableName>,
    pub aggregates: Vec<AggregatePrototype>,
    pub output_names: Vec<VariableName>,
    pub emit_mode: EmitMode,
    pub capacity_hint: usize,
}

pub struct GroupBy {
    source: Box<dyn Operator>,
    spec: GroupBySpec,
    groups: GroupTable,
    state: GroupByState,
    drain_cursor: usize,
}

impl GroupBy {
    pub fn new(source: Box<dyn Operator>, spec: GroupBySpec) -> Result<Self, PlanStreamError> {
        if spec.key.len() != spec.key_names.len() {
            return Err(PlanStreamError::Compilation(format!(
                "group by has {} key expressions but {} key names",
                spec.key.len(),
                spec.key_names.len()
            )));
        }
        if spec.fields.len() != spec.aggregates.len()
            || spec.fields.len() != spec.output_names.len()
        {
            return Err(PlanStreamError::Compilation(format!(
                "group by fields ({}), aggregates ({}) and output names ({}) differ in length",
                spec.fields.len(),
                spec.aggregates.len(),
                spec.output_names.len()
            )));
        }
        let groups = GroupTable::with_capacity(spec.capacity_hint);
        Ok(GroupBy {
            source,
            spec,
            groups,
            state: GroupByState::Open,
            drain_cursor: 0,
        })
    }

    pub fn state(&self) -> GroupByState {
        self.state
    }

    /// Number of distinct keys seen so far.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn transition(&mut self, to: GroupByState) {
        tracing::debug!(from = ?self.state, to = ?to, groups = self.groups.len(), "group by state change");
        self.state = to;
    }

    fn evaluate_key(&self, record: &Record) -> Result<GroupKey, PlanStreamError> {
        self.spec
            .key
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                expr.evaluate(record).map_err(|e| {
                    e.context(format_args!("couldn't evaluate group key expression with index {i}"))
                })
            })
            .collect()
    }

    fn evaluate_fields(&self, record: &Record) -> Result<Vec<Value>, PlanStreamError> {
        self.spec
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                if field.is_empty() {
                    return Ok(STAR);
                }
                record.value(field).cloned().ok_or_else(|| {
                    PlanStreamError::Evaluation(format!(
                        "couldn't evaluate aggregated field with index {i}: field {field} not found in record"
                    ))
                })
            })
            .collect()
    }

    /// Route one input record into its group. Returns the group's slot.
    fn apply(&mut self, record: &Record) -> Result<usize, PlanStreamError> {
        let key = self.evaluate_key(record)?;
        let values = self.evaluate_fields(record)?;
        let kind = record.event_kind();

        match (self.groups.find(&key), kind) {
            (Some(slot), _) => {
                self.groups.groups[slot].update(kind, &values, &self.spec.aggregates)?;
                Ok(slot)
            }
            (None, EventKind::Insert) => {
                let mut group = GroupState::new(key, &self.spec.aggregates);
                group.update(kind, &values, &self.spec.aggregates)?;
                tracing::debug!(key = ?group.key, "new group");
                Ok(self.groups.insert(group))
            }
            (None, EventKind::Retract) => Err(PlanStreamError::InconsistentRetraction(format!(
                "retraction for group {key:?} that was never inserted"
            ))),
        }
    }

    /// The current output row of a group.
    fn row(&self, slot: usize, event_kind: EventKind) -> Result<Record, PlanStreamError> {
        let group = &self.groups.groups[slot];
        let mut names = self.spec.key_names.clone();
        names.extend(self.spec.output_names.iter().cloned());

        let mut values = group.key.clone();
        for (i, acc) in group.accumulators.iter().enumerate() {
            match acc.current() {
                Ok(v) => values.push(v),
                Err(e) if e.is_value_level() => {
                    tracing::debug!(output = %self.spec.output_names[i], error = %e, "aggregate has no value, emitting null");
                    values.push(Value::Null);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Record::new(names, values, event_kind))
    }

    fn step(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        loop {
            match self.state {
                GroupByState::Open => {
                    ctx.check_cancelled("group by")?;
                    let Some(record) = self.source.next(ctx)? else {
                        self.transition(GroupByState::Draining);
                        continue;
                    };
                    tracing::trace!(record = %record, "group by input");
                    let slot = self.apply(&record)?;
                    if self.spec.emit_mode == EmitMode::Changelog {
                        return self.row(slot, record.event_kind()).map(Some);
                    }
                }
                GroupByState::Draining => {
                    if self.spec.emit_mode == EmitMode::Final {
                        ctx.check_cancelled("group by")?;
                        while self.drain_cursor < self.groups.len() {
                            let slot = self.drain_cursor;
                            self.drain_cursor += 1;
                            if self.groups.groups[slot].live > 0 {
                                return self.row(slot, EventKind::Insert).map(Some);
                            }
                        }
                    }
                    self.transition(GroupByState::Closed);
                }
                GroupByState::Closed => return Ok(None),
                GroupByState::Failed => {
                    return Err(PlanStreamError::InternalError(
                        "group by pulled after a failed pull".into(),
                    ));
                }
            }
        }
    }
}

impl Operator for GroupBy {
    fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        let result = self.step(ctx);
        if result.is_err() && self.state != GroupByState::Failed {
            self.transition(GroupByState::Failed);
        }
        result
    }
}

//! Aggregate kinds, accumulators, and the prototype registry.
//!
//! An [`Accumulator`] holds the per-group, per-aggregate state and supports
//! incremental incorporation and undo of contributing values. The registry
//! maps every [`Aggregate`] kind to exactly one constructor through an
//! exhaustive `match`, so there is no lookup that can fail at run time: the
//! only unknown-aggregate failure is parsing a name, which happens while the
//! plan is being built.
//!
//! | kind            | accumulator                         |
//! |-----------------|-------------------------------------|
//! | `avg`           | [`avg::Avg`]                        |
//! | `avg_distinct`  | [`distinct::Distinct`] over `Avg`   |
//! | `count`         | [`count::Count`]                    |
//! | `count_distinct`| [`distinct::Distinct`] over `Count` |
//! | `first`/`last`  | [`arrival::ArrivalOrder`]           |
//! | `min`/`max`     | [`extremum`] (ordered or rescan)    |
//! | `sum`           | [`sum::Sum`]                        |
//! | `sum_distinct`  | [`distinct::Distinct`] over `Sum`   |

pub mod arrival;
pub mod avg;
pub mod count;
pub mod distinct;
pub mod extremum;
pub mod live;
pub mod sum;

use crate::config::ExtremumStrategy;
use crate::error::PlanStreamError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Per-group state of one aggregate.
///
/// The `check_*` methods fail exactly when the matching mutation would,
/// without changing anything, so a caller can validate a whole row of
/// accumulators before touching any of them. A failed mutation leaves the
/// accumulator as it was.
pub trait Accumulator: fmt::Debug {
    /// Whether `incorporate(value)` would succeed.
    fn check_incorporate(&self, _value: &Value) -> Result<(), PlanStreamError> {
        Ok(())
    }

    /// Add a value to the aggregate.
    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError>;

    /// Whether `undo(value)` would succeed.
    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError>;

    /// Withdraw a previously incorporated value.
    ///
    /// Withdrawing a value that is not currently incorporated is an
    /// `InconsistentRetraction`.
    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError>;

    /// The aggregate over the currently incorporated values.
    fn current(&self) -> Result<Value, PlanStreamError>;
}

/// Aggregate function kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Avg,
    AvgDistinct,
    Count,
    CountDistinct,
    First,
    Last,
    Max,
    Min,
    Sum,
    SumDistinct,
}

impl Aggregate {
    pub const ALL: [Aggregate; 10] = [
        Aggregate::Avg,
        Aggregate::AvgDistinct,
        Aggregate::Count,
        Aggregate::CountDistinct,
        Aggregate::First,
        Aggregate::Last,
        Aggregate::Max,
        Aggregate::Min,
        Aggregate::Sum,
        Aggregate::SumDistinct,
    ];

    /// Parse an aggregate name, case-insensitively.
    pub fn parse(name: &str) -> Result<Aggregate, PlanStreamError> {
        let normalized = name.trim().to_ascii_lowercase().replace(' ', "_");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| PlanStreamError::Compilation(format!("unknown aggregate {name:?}")))
    }

    /// Canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Avg => "avg",
            Aggregate::AvgDistinct => "avg_distinct",
            Aggregate::Count => "count",
            Aggregate::CountDistinct => "count_distinct",
            Aggregate::First => "first",
            Aggregate::Last => "last",
            Aggregate::Max => "max",
            Aggregate::Min => "min",
            Aggregate::Sum => "sum",
            Aggregate::SumDistinct => "sum_distinct",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregate {
    type Err = PlanStreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregate::parse(s)
    }
}

/// Settings that influence how accumulators are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateOptions {
    pub extremum_strategy: ExtremumStrategy,
}

type Constructor = fn(&AggregateOptions) -> Box<dyn Accumulator>;

fn new_avg(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(avg::Avg::default())
}

fn new_avg_distinct(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(distinct::Distinct::new(Box::new(avg::Avg::default())))
}

fn new_count(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(count::Count::default())
}

fn new_count_distinct(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(distinct::Distinct::new(Box::new(count::Count::default())))
}

fn new_first(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(arrival::ArrivalOrder::new(arrival::End::First))
}

fn new_last(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(arrival::ArrivalOrder::new(arrival::End::Last))
}

fn new_max(options: &AggregateOptions) -> Box<dyn Accumulator> {
    extremum::new_extremum(extremum::Extremum::Max, options.extremum_strategy)
}

fn new_min(options: &AggregateOptions) -> Box<dyn Accumulator> {
    extremum::new_extremum(extremum::Extremum::Min, options.extremum_strategy)
}

fn new_sum(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(sum::Sum::default())
}

fn new_sum_distinct(_: &AggregateOptions) -> Box<dyn Accumulator> {
    Box::new(distinct::Distinct::new(Box::new(sum::Sum::default())))
}

/// The fixed kind → constructor table.
fn constructor(kind: Aggregate) -> Constructor {
    match kind {
        Aggregate::Avg => new_avg,
        Aggregate::AvgDistinct => new_avg_distinct,
        Aggregate::Count => new_count,
        Aggregate::CountDistinct => new_count_distinct,
        Aggregate::First => new_first,
        Aggregate::Last => new_last,
        Aggregate::Max => new_max,
        Aggregate::Min => new_min,
        Aggregate::Sum => new_sum,
        Aggregate::SumDistinct => new_sum_distinct,
    }
}

/// A resolved aggregate: builds a fresh accumulator for every new group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatePrototype {
    kind: Aggregate,
    options: AggregateOptions,
}

impl AggregatePrototype {
    pub fn kind(&self) -> Aggregate {
        self.kind
    }

    pub fn new_accumulator(&self) -> Box<dyn Accumulator> {
        constructor(self.kind)(&self.options)
    }
}

/// Resolve an aggregate kind through the registry.
pub fn prototype(kind: Aggregate, options: AggregateOptions) -> AggregatePrototype {
    AggregatePrototype { kind, options }
}

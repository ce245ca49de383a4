//! Records and event kinds.
//!
//! A record is an ordered list of named values tagged with an event kind.
//! Records are immutable once produced; anything that needs a different
//! record builds a new one.

use crate::value::{Value, VariableName};
use std::fmt;

/// Whether a record adds to or withdraws from downstream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventKind {
    #[default]
    Insert,
    Retract,
}

impl EventKind {
    pub fn inverted(self) -> Self {
        match self {
            EventKind::Insert => EventKind::Retract,
            EventKind::Retract => EventKind::Insert,
        }
    }

    pub fn is_retraction(self) -> bool {
        self == EventKind::Retract
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Insert => write!(f, "+"),
            EventKind::Retract => write!(f, "-"),
        }
    }
}

/// A named, ordered tuple of values with an event kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<VariableName>,
    values: Vec<Value>,
    event_kind: EventKind,
}

impl Record {
    /// Build a record. Extra names or values beyond the shorter list are
    /// dropped.
    pub fn new(fields: Vec<VariableName>, mut values: Vec<Value>, event_kind: EventKind) -> Self {
        let mut fields = fields;
        let len = fields.len().min(values.len());
        fields.truncate(len);
        values.truncate(len);
        Record {
            fields,
            values,
            event_kind,
        }
    }

    /// Build an insert record from `(name, value)` pairs.
    pub fn insert<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<VariableName>,
        V: Into<Value>,
    {
        Self::from_pairs(pairs, EventKind::Insert)
    }

    /// Build a retraction record from `(name, value)` pairs.
    pub fn retract<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<VariableName>,
        V: Into<Value>,
    {
        Self::from_pairs(pairs, EventKind::Retract)
    }

    fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>, event_kind: EventKind) -> Self
    where
        N: Into<VariableName>,
        V: Into<Value>,
    {
        let (fields, values) = pairs
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .unzip();
        Record {
            fields,
            values,
            event_kind,
        }
    }

    pub fn fields(&self) -> &[VariableName] {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn event_kind(&self) -> EventKind {
        self.event_kind
    }

    /// Look up a field's value by name. The first match wins.
    pub fn value(&self, name: &VariableName) -> Option<&Value> {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|i| &self.values[i])
    }

    /// A copy of this record carrying a different event kind.
    pub fn with_event_kind(&self, event_kind: EventKind) -> Record {
        Record {
            fields: self.fields.clone(),
            values: self.values.clone(),
            event_kind,
        }
    }

    /// Two records cancel when their fields and values match and their
    /// event kinds are opposite.
    pub fn cancels(&self, other: &Record) -> bool {
        self.event_kind == other.event_kind.inverted()
            && self.fields == other.fields
            && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .zip(&self.values)
            .map(|(n, v)| format!("{n}: {v}"))
            .collect();
        write!(f, "{}{{{}}}", self.event_kind, parts.join(", "))
    }
}

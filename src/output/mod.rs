//! Sinks: terminal consumers of emitted records.
//!
//! The driver calls [`Output::write_record`] once per emitted record in
//! emission order and [`Output::close`] exactly once after the root operator
//! is exhausted.
//!
//! # Submodules
//! - `json`: JSON-array framing over any `io::Write`

pub mod json;

pub use json::JsonArrayOutput;

use crate::error::PlanStreamError;
use crate::record::Record;

pub trait Output {
    fn write_record(&mut self, record: &Record) -> Result<(), PlanStreamError>;

    fn close(&mut self) -> Result<(), PlanStreamError>;
}

/// Sink collecting records in memory.
#[derive(Debug, Default)]
pub struct CollectOutput {
    pub records: Vec<Record>,
    pub closed: usize,
}

impl Output for CollectOutput {
    fn write_record(&mut self, record: &Record) -> Result<(), PlanStreamError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), PlanStreamError> {
        self.closed += 1;
        Ok(())
    }
}

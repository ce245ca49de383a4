//! plan_stream: physical query plans over insert/retract record streams.
//!
//! A plan is an owned tree of [`physical::PlanNode`]s. It can be rewritten
//! with [`physical::Transformers`], inspected through its
//! [`physical::NodeMetadata`], and compiled by `materialize` into a tree of
//! pull-based [`exec::Operator`]s that [`pipeline::run`] pumps into an
//! [`output::Output`].
//!
//! The central operator is the streaming [`exec::GroupBy`]: it keeps one
//! accumulator set per distinct key and answers every inserted or retracted
//! input record with the group's corrected aggregate. Its changelog is meant
//! for sinks; feeding it into a second group by is not supported.
//!
//! ```text
//!   PlanNode ──transform──▶ PlanNode ──materialize──▶ Operator ──run──▶ Output
//!                              │
//!                           metadata
//! ```

pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod output;
pub mod physical;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod value;

pub use error::PlanStreamError;

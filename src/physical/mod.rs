//! Physical plans.
//!
//! A physical plan is an owned tree of [`PlanNode`]s. Each node supports
//! four operations:
//!
//! - `transform`: rebuild the tree through a [`Transformers`] bundle
//! - `materialize`: compile into a runnable [`Operator`] tree
//! - `metadata`: cardinality class and leading key, recomputed on demand
//! - `visualize`: a labelled [`graph::Node`] tree
//!
//! # Submodules
//! - `expression`: transformable scalar expressions
//! - `metadata`: [`Cardinality`] and [`NodeMetadata`]
//! - `transform`: the [`Transformers`] handler bundle
//! - `graph`: visualization trees
//! - `scan`, `filter`, `map`, `union_all`, `group_by`: node kinds

pub mod expression;
pub mod filter;
pub mod graph;
pub mod group_by;
pub mod map;
pub mod metadata;
pub mod scan;
pub mod transform;
pub mod union_all;

#[cfg(test)]
pub mod test_helpers;

pub use expression::Expression;
pub use filter::Filter;
pub use group_by::{Aggregate, GroupBy};
pub use map::Map;
pub use metadata::{Cardinality, NodeMetadata};
pub use scan::Scan;
pub use transform::Transformers;
pub use union_all::UnionAll;

use crate::config::EngineConfig;
use crate::error::PlanStreamError;
use crate::exec::Operator;
use crate::source::DataSource;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    Scan(Scan),
    Filter(Filter),
    Map(Map),
    UnionAll(UnionAll),
    GroupBy(GroupBy),
}

impl PlanNode {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanNode::Scan(_) => "Scan",
            PlanNode::Filter(_) => "Filter",
            PlanNode::Map(_) => "Map",
            PlanNode::UnionAll(_) => "UnionAll",
            PlanNode::GroupBy(_) => "GroupBy",
        }
    }

    pub fn transform(&self, t: &Transformers<'_>) -> PlanNode {
        match self {
            PlanNode::Scan(n) => n.transform(t),
            PlanNode::Filter(n) => n.transform(t),
            PlanNode::Map(n) => n.transform(t),
            PlanNode::UnionAll(n) => n.transform(t),
            PlanNode::GroupBy(n) => n.transform(t),
        }
    }

    pub fn materialize(
        &self,
        ctx: &MaterializationContext,
    ) -> Result<Box<dyn Operator>, PlanStreamError> {
        match self {
            PlanNode::Scan(n) => n.materialize(ctx),
            PlanNode::Filter(n) => n.materialize(ctx),
            PlanNode::Map(n) => n.materialize(ctx),
            PlanNode::UnionAll(n) => n.materialize(ctx),
            PlanNode::GroupBy(n) => n.materialize(ctx),
        }
    }

    pub fn metadata(&self) -> NodeMetadata {
        match self {
            PlanNode::Scan(n) => n.metadata(),
            PlanNode::Filter(n) => n.metadata(),
            PlanNode::Map(n) => n.metadata(),
            PlanNode::UnionAll(n) => n.metadata(),
            PlanNode::GroupBy(n) => n.metadata(),
        }
    }

    pub fn visualize(&self) -> graph::Node {
        match self {
            PlanNode::Scan(n) => n.visualize(),
            PlanNode::Filter(n) => n.visualize(),
            PlanNode::Map(n) => n.visualize(),
            PlanNode::UnionAll(n) => n.visualize(),
            PlanNode::GroupBy(n) => n.visualize(),
        }
    }
}

// ── Materialization context ────────────────────────────────────────────

/// Read-only environment shared by every `materialize` call of one plan.
#[derive(Clone, Default)]
pub struct MaterializationContext {
    pub config: EngineConfig,
    sources: HashMap<String, Arc<dyn DataSource>>,
}

impl MaterializationContext {
    pub fn new(config: EngineConfig) -> Self {
        MaterializationContext {
            config,
            sources: HashMap::new(),
        }
    }

    pub fn with_source(mut self, name: impl Into<String>, source: Arc<dyn DataSource>) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    pub fn source(&self, name: &str) -> Result<&Arc<dyn DataSource>, PlanStreamError> {
        self.sources
            .get(name)
            .ok_or_else(|| PlanStreamError::Compilation(format!("unknown data source {name:?}")))
    }
}

impl fmt::Debug for MaterializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.sources.keys().collect();
        names.sort();
        f.debug_struct("MaterializationContext")
            .field("config", &self.config)
            .field("sources", &names)
            .finish()
    }
}

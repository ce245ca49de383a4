use super::graph;
use super::metadata::{Cardinality, NodeMetadata};
use super::transform::Transformers;
use super::{MaterializationContext, PlanNode};
use crate::error::PlanStreamError;
use crate::exec;
use crate::exec::Operator;
use crate::value::VariableName;

/// Read a named data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub name: String,
    /// Declared size class of the source.
    pub cardinality: Cardinality,
    pub leading_key: VariableName,
}

impl Scan {
    pub fn new(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Scan {
            name: name.into(),
            cardinality,
            leading_key: VariableName::empty(),
        }
    }

    pub fn with_leading_key(mut self, key: impl Into<VariableName>) -> Self {
        self.leading_key = key.into();
        self
    }

    pub fn transform(&self, t: &Transformers<'_>) -> PlanNode {
        t.finish_scan(self.clone())
    }

    pub fn materialize(
        &self,
        ctx: &MaterializationContext,
    ) -> Result<Box<dyn Operator>, PlanStreamError> {
        let source = ctx.source(&self.name)?;
        let inner = source
            .open()
            .map_err(|e| e.context(format_args!("couldn't open source {}", self.name)))?;
        Ok(Box::new(exec::scan::Scan::new(self.name.clone(), inner)))
    }

    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new(self.cardinality, self.leading_key.clone())
    }

    pub fn visualize(&self) -> graph::Node {
        let node = graph::Node::new("scan")
            .field("name", self.name.as_str())
            .field("cardinality", self.cardinality.to_string());
        if self.leading_key.is_empty() {
            node
        } else {
            node.field("leading_key", self.leading_key.as_str())
        }
    }
}

use super::expression::Expression;
use super::graph;
use super::metadata::NodeMetadata;
use super::transform::Transformers;
use super::{MaterializationContext, PlanNode};
use crate::error::PlanStreamError;
use crate::exec;
use crate::exec::Operator;

/// Keep records for which the predicate is `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub source: Box<PlanNode>,
    pub predicate: Expression,
}

impl Filter {
    pub fn new(source: PlanNode, predicate: Expression) -> Self {
        Filter {
            source: Box::new(source),
            predicate,
        }
    }

    pub fn transform(&self, t: &Transformers<'_>) -> PlanNode {
        let predicate = self.predicate.transform(t);
        let source = self.source.transform(t);
        t.finish_filter(Filter::new(source, predicate))
    }

    pub fn materialize(
        &self,
        ctx: &MaterializationContext,
    ) -> Result<Box<dyn Operator>, PlanStreamError> {
        let source = self
            .source
            .materialize(ctx)
            .map_err(|e| e.context("couldn't materialize Source node"))?;
        let predicate = self
            .predicate
            .materialize()
            .map_err(|e| e.context("couldn't materialize filter predicate"))?;
        Ok(Box::new(exec::filter::Filter::new(source, predicate)))
    }

    /// Filtering never grows the output or reorders it.
    pub fn metadata(&self) -> NodeMetadata {
        self.source.metadata()
    }

    pub fn visualize(&self) -> graph::Node {
        graph::Node::new("filter")
            .child("predicate", self.predicate.visualize())
            .child("source", self.source.visualize())
    }
}

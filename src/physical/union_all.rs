use super::graph;
use super::metadata::{Cardinality, NodeMetadata};
use super::transform::Transformers;
use super::{MaterializationContext, PlanNode};
use crate::error::PlanStreamError;
use crate::exec;
use crate::exec::Operator;

/// Concatenate the streams of all sources.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionAll {
    pub sources: Vec<PlanNode>,
}

impl UnionAll {
    pub fn new(sources: Vec<PlanNode>) -> Self {
        UnionAll { sources }
    }

    pub fn transform(&self, t: &Transformers<'_>) -> PlanNode {
        let sources = self.sources.iter().map(|s| s.transform(t)).collect();
        t.finish_union_all(UnionAll::new(sources))
    }

    pub fn materialize(
        &self,
        ctx: &MaterializationContext,
    ) -> Result<Box<dyn Operator>, PlanStreamError> {
        let children = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.materialize(ctx).map_err(|e| {
                    e.context(format_args!("couldn't materialize source with index {i}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(exec::union_all::UnionAll::new(children)))
    }

    /// Interleaving destroys any leading key.
    pub fn metadata(&self) -> NodeMetadata {
        let cardinality = self
            .sources
            .iter()
            .map(|s| s.metadata().cardinality())
            .fold(Cardinality::BoundedFitsInLocalStorage, Cardinality::combine);
        NodeMetadata::without_leading_key(cardinality)
    }

    pub fn visualize(&self) -> graph::Node {
        self.sources
            .iter()
            .enumerate()
            .fold(graph::Node::new("union_all"), |node, (i, s)| {
                node.child(format!("source_{i}"), s.visualize())
            })
    }
}

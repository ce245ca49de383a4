use super::expression::Expression;
use super::graph;
use super::metadata::NodeMetadata;
use super::transform::Transformers;
use super::{MaterializationContext, PlanNode};
use crate::error::PlanStreamError;
use crate::exec;
use crate::exec::Operator;
use crate::value::VariableName;

/// Project every record through `expressions`, naming the outputs by
/// `aliases` (an empty alias falls back to the expression's own name, then
/// to `col_{i}`).
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub source: Box<PlanNode>,
    expressions: Vec<Expression>,
    aliases: Vec<VariableName>,
}

impl Map {
    pub fn new(
        source: PlanNode,
        expressions: Vec<Expression>,
        aliases: Vec<VariableName>,
    ) -> Result<Self, PlanStreamError> {
        if expressions.len() != aliases.len() {
            return Err(PlanStreamError::Compilation(format!(
                "map has {} expressions but {} aliases",
                expressions.len(),
                aliases.len()
            )));
        }
        Ok(Map {
            source: Box::new(source),
            expressions,
            aliases,
        })
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn aliases(&self) -> &[VariableName] {
        &self.aliases
    }

    /// Output field names, positionally aligned with the expressions.
    pub fn output_names(&self) -> Vec<VariableName> {
        self.expressions
            .iter()
            .zip(&self.aliases)
            .enumerate()
            .map(|(i, (expr, alias))| {
                if !alias.is_empty() {
                    return alias.clone();
                }
                let name = expr.output_name();
                if name.is_empty() {
                    VariableName::new(format!("col_{i}"))
                } else {
                    name
                }
            })
            .collect()
    }

    pub fn transform(&self, t: &Transformers<'_>) -> PlanNode {
        let expressions = self.expressions.iter().map(|e| e.transform(t)).collect();
        let source = self.source.transform(t);
        t.finish_map(Map {
            source: Box::new(source),
            expressions,
            aliases: self.aliases.clone(),
        })
    }

    pub fn materialize(
        &self,
        ctx: &MaterializationContext,
    ) -> Result<Box<dyn Operator>, PlanStreamError> {
        let source = self
            .source
            .materialize(ctx)
            .map_err(|e| e.context("couldn't materialize Source node"))?;
        let expressions = self
            .expressions
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                expr.materialize().map_err(|e| {
                    e.context(format_args!("couldn't materialize map expression with index {i}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(exec::map::Map::new(
            source,
            expressions,
            self.output_names(),
        )?))
    }

    /// The leading key survives only if it is projected unchanged.
    pub fn metadata(&self) -> NodeMetadata {
        let source = self.source.metadata();
        let leading = source.leading_key();
        let kept = if leading.is_empty() {
            None
        } else {
            self.expressions
                .iter()
                .zip(self.output_names())
                .find(|(expr, _)| matches!(expr, Expression::Variable(v) if v == leading))
                .map(|(_, name)| name)
        };
        NodeMetadata::new(source.cardinality(), kept.unwrap_or_else(VariableName::empty))
    }

    pub fn visualize(&self) -> graph::Node {
        let node = self
            .expressions
            .iter()
            .zip(self.output_names())
            .enumerate()
            .fold(graph::Node::new("map"), |node, (i, (expr, name))| {
                node.field(format!("name_{i}"), name.as_str())
                    .child(format!("expr_{i}"), expr.visualize())
            });
        node.child("source", self.source.visualize())
    }
}

use super::expression::Expression;
use super::graph;
use super::metadata::{Cardinality, NodeMetadata};
use super::transform::Transformers;
use super::{MaterializationContext, PlanNode};
use crate::error::PlanStreamError;
use crate::exec;
use crate::exec::Operator;
use crate::exec::aggregates::{AggregateOptions, prototype};
use crate::exec::group_by::GroupBySpec;
use crate::value::VariableName;

pub use crate::exec::aggregates::Aggregate;

/// Grouped aggregation.
///
/// `fields[i]` is aggregated with `aggregates[i]` and emitted as
/// `as_names[i]`; an empty field name aggregates over whole records (`*`),
/// an empty alias falls back to `"{aggregate}({field})"`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    source: Box<PlanNode>,
    key: Vec<Expression>,
    fields: Vec<VariableName>,
    aggregates: Vec<Aggregate>,
    as_names: Vec<VariableName>,
}

impl GroupBy {
    pub fn new(
        source: PlanNode,
        key: Vec<Expression>,
        fields: Vec<VariableName>,
        aggregates: Vec<Aggregate>,
        as_names: Vec<VariableName>,
    ) -> Result<Self, PlanStreamError> {
        let node = GroupBy {
            source: Box::new(source),
            key,
            fields,
            aggregates,
            as_names,
        };
        node.check_shape()?;
        Ok(node)
    }

    fn check_shape(&self) -> Result<(), PlanStreamError> {
        if self.fields.len() != self.aggregates.len() || self.fields.len() != self.as_names.len() {
            return Err(PlanStreamError::Compilation(format!(
                "group by needs as many fields ({}), aggregates ({}) and aliases ({})",
                self.fields.len(),
                self.aggregates.len(),
                self.as_names.len()
            )));
        }
        Ok(())
    }

    pub fn source(&self) -> &PlanNode {
        &self.source
    }

    pub fn key(&self) -> &[Expression] {
        &self.key
    }

    pub fn fields(&self) -> &[VariableName] {
        &self.fields
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn as_names(&self) -> &[VariableName] {
        &self.as_names
    }

    /// Output names of the key columns.
    pub fn key_names(&self) -> Vec<VariableName> {
        self.key
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                let name = expr.output_name();
                if name.is_empty() {
                    VariableName::new(format!("key_{i}"))
                } else {
                    name
                }
            })
            .collect()
    }

    fn describe(&self, i: usize) -> String {
        let field = if self.fields[i].is_empty() {
            "*"
        } else {
            self.fields[i].as_str()
        };
        format!("{}({field})", self.aggregates[i])
    }

    /// Output names of the aggregate columns.
    pub fn output_names(&self) -> Vec<VariableName> {
        (0..self.fields.len())
            .map(|i| {
                if self.as_names[i].is_empty() {
                    VariableName::new(self.describe(i))
                } else {
                    self.as_names[i].clone()
                }
            })
            .collect()
    }

    pub fn transform(&self, t: &Transformers<'_>) -> PlanNode {
        let key = self.key.iter().map(|e| e.transform(t)).collect();
        let source = self.source.transform(t);
        t.finish_group_by(GroupBy {
            source: Box::new(source),
            key,
            fields: self.fields.clone(),
            aggregates: self.aggregates.clone(),
            as_names: self.as_names.clone(),
        })
    }

    pub fn materialize(
        &self,
        ctx: &MaterializationContext,
    ) -> Result<Box<dyn Operator>, PlanStreamError> {
        self.check_shape()?;
        let emit_mode = ctx.config.emit_mode;
        let source_cardinality = self.source.metadata().cardinality();
        if emit_mode.requires_bounded_input() && !source_cardinality.is_bounded() {
            return Err(PlanStreamError::Compilation(format!(
                "group by in {emit_mode:?} emit mode needs a bounded source, got {source_cardinality}"
            )));
        }

        let source = self
            .source
            .materialize(ctx)
            .map_err(|e| e.context("couldn't materialize Source node"))?;
        let key = self
            .key
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                expr.materialize().map_err(|e| {
                    e.context(format_args!("couldn't materialize group key expression with index {i}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let options = AggregateOptions {
            extremum_strategy: ctx.config.extremum_strategy,
        };
        let aggregates = self
            .aggregates
            .iter()
            .map(|kind| prototype(*kind, options))
            .collect();

        tracing::debug!(
            keys = self.key.len(),
            aggregates = self.aggregates.len(),
            ?emit_mode,
            "materialized group by"
        );
        let spec = GroupBySpec {
            key,
            key_names: self.key_names(),
            fields: self.fields.clone(),
            aggregates,
            output_names: self.output_names(),
            emit_mode,
            capacity_hint: ctx.config.group_capacity_hint,
        };
        Ok(Box::new(exec::group_by::GroupBy::new(source, spec)?))
    }

    /// One row per distinct key is held locally, whatever the input size.
    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata::without_leading_key(Cardinality::BoundedFitsInLocalStorage)
    }

    pub fn visualize(&self) -> graph::Node {
        let mut node = graph::Node::new("group_by");
        for i in 0..self.fields.len() {
            let mut value = self.describe(i);
            if !self.as_names[i].is_empty() {
                value.push_str(" as ");
                value.push_str(self.as_names[i].as_str());
            }
            node = node.field(format!("field_{i}"), value);
        }
        node = node.child("source", self.source.visualize());
        for (i, expr) in self.key.iter().enumerate() {
            node = node.child(format!("key_{i}"), expr.visualize());
        }
        node
    }
}

//! Shared helpers for integration tests: plan builders and a runner that
//! materializes a plan over in-memory sources and collects its output.

#![allow(dead_code)]

use plan_stream::PlanStreamError;
use plan_stream::config::EngineConfig;
use plan_stream::exec::ExecutionContext;
use plan_stream::output::CollectOutput;
use plan_stream::physical::{
    Aggregate, Cardinality, Expression, GroupBy, MaterializationContext, PlanNode, Scan,
};
use plan_stream::pipeline;
use plan_stream::record::Record;
use plan_stream::source::InMemorySource;
use plan_stream::value::{Value, VariableName};
use std::sync::Arc;

pub fn var(name: &str) -> Expression {
    Expression::Variable(name.into())
}

pub fn scan(name: &str) -> PlanNode {
    PlanNode::Scan(Scan::new(name, Cardinality::BoundedFitsInLocalStorage))
}

/// `GroupBy(source)` keyed by `keys`, with `(field, aggregate, alias)` triples.
pub fn group_by(source: PlanNode, keys: &[&str], aggs: &[(&str, Aggregate, &str)]) -> PlanNode {
    let node = GroupBy::new(
        source,
        keys.iter().map(|k| var(k)).collect(),
        aggs.iter().map(|(f, _, _)| VariableName::from(*f)).collect(),
        aggs.iter().map(|(_, a, _)| *a).collect(),
        aggs.iter().map(|(_, _, n)| VariableName::from(*n)).collect(),
    )
    .expect("aligned group by");
    PlanNode::GroupBy(node)
}

/// Materialize `plan` over named in-memory sources and run it to
/// completion, returning every emitted record.
pub fn run_plan(
    plan: &PlanNode,
    sources: Vec<(&str, Vec<Record>)>,
    config: EngineConfig,
) -> Result<Vec<Record>, PlanStreamError> {
    let ctx = sources
        .into_iter()
        .fold(MaterializationContext::new(config), |ctx, (name, records)| {
            ctx.with_source(name, Arc::new(InMemorySource::new(records)))
        });
    let mut root = pipeline::compile(plan, &ctx)?;
    let mut out = CollectOutput::default();
    pipeline::run(root.as_mut(), &ExecutionContext::default(), &mut out)?;
    assert_eq!(out.closed, 1, "output must be closed exactly once");
    Ok(out.records)
}

pub fn order(country: &str, amount: i64) -> [(&'static str, Value); 2] {
    [("country", Value::from(country)), ("amount", Value::Int(amount))]
}

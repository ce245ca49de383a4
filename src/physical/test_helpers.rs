//! Shared builders for physical plan unit tests.

use super::expression::Expression;
use super::{Aggregate, Cardinality, Filter, GroupBy, PlanNode, Scan};
use crate::value::{Value, VariableName};

// ── Expression builders ─────────────────────────────────────────────────

pub fn var(name: &str) -> Expression {
    Expression::Variable(name.into())
}

pub fn int(v: i64) -> Expression {
    Expression::Constant(Value::Int(v))
}

pub fn call(name: &str, args: Vec<Expression>) -> Expression {
    Expression::FunctionCall {
        name: name.to_string(),
        args,
    }
}

// ── PlanNode builders ───────────────────────────────────────────────────

/// A bounded scan with no leading key.
pub fn scan(name: &str) -> PlanNode {
    PlanNode::Scan(Scan::new(name, Cardinality::BoundedFitsInLocalStorage))
}

pub fn scan_with(name: &str, cardinality: Cardinality, leading_key: &str) -> PlanNode {
    PlanNode::Scan(Scan::new(name, cardinality).with_leading_key(leading_key))
}

pub fn filter(source: PlanNode, predicate: Expression) -> PlanNode {
    PlanNode::Filter(Filter::new(source, predicate))
}

/// Build a GroupBy from `(field, aggregate, alias)` triples.
pub fn group_by(
    source: PlanNode,
    key: Vec<Expression>,
    aggs: &[(&str, Aggregate, &str)],
) -> PlanNode {
    let node = GroupBy::new(
        source,
        key,
        aggs.iter().map(|(f, _, _)| VariableName::from(*f)).collect(),
        aggs.iter().map(|(_, a, _)| *a).collect(),
        aggs.iter().map(|(_, _, n)| VariableName::from(*n)).collect(),
    )
    .unwrap();
    PlanNode::GroupBy(node)
}

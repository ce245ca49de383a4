//! Tree rewriting.
//!
//! A [`Transformers`] bundle holds at most one handler per node kind plus
//! one for expressions. `transform` rebuilds the tree bottom-up: a node's
//! sub-expressions are transformed first, then its sources in declared
//! order, then the node is rebuilt from the results and finally passed to
//! the handler registered for its kind, if any. Handlers therefore always
//! see an already-rewritten subtree.
//!
//! A missing handler is the identity for that kind only. Transforming with
//! an empty bundle yields an equal tree that shares nothing with the input.

use super::expression::Expression;
use super::{Filter, GroupBy, Map, PlanNode, Scan, UnionAll};

type Handler<'a, N> = Box<dyn Fn(N) -> PlanNode + 'a>;

#[derive(Default)]
pub struct Transformers<'a> {
    scan: Option<Handler<'a, Scan>>,
    filter: Option<Handler<'a, Filter>>,
    map: Option<Handler<'a, Map>>,
    union_all: Option<Handler<'a, UnionAll>>,
    group_by: Option<Handler<'a, GroupBy>>,
    expr: Option<Box<dyn Fn(Expression) -> Expression + 'a>>,
}

impl<'a> Transformers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_scan(mut self, f: impl Fn(Scan) -> PlanNode + 'a) -> Self {
        self.scan = Some(Box::new(f));
        self
    }

    pub fn on_filter(mut self, f: impl Fn(Filter) -> PlanNode + 'a) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    pub fn on_map(mut self, f: impl Fn(Map) -> PlanNode + 'a) -> Self {
        self.map = Some(Box::new(f));
        self
    }

    pub fn on_union_all(mut self, f: impl Fn(UnionAll) -> PlanNode + 'a) -> Self {
        self.union_all = Some(Box::new(f));
        self
    }

    pub fn on_group_by(mut self, f: impl Fn(GroupBy) -> PlanNode + 'a) -> Self {
        self.group_by = Some(Box::new(f));
        self
    }

    pub fn on_expression(mut self, f: impl Fn(Expression) -> Expression + 'a) -> Self {
        self.expr = Some(Box::new(f));
        self
    }

    pub(super) fn finish_scan(&self, node: Scan) -> PlanNode {
        finish(&self.scan, node, PlanNode::Scan)
    }

    pub(super) fn finish_filter(&self, node: Filter) -> PlanNode {
        finish(&self.filter, node, PlanNode::Filter)
    }

    pub(super) fn finish_map(&self, node: Map) -> PlanNode {
        finish(&self.map, node, PlanNode::Map)
    }

    pub(super) fn finish_union_all(&self, node: UnionAll) -> PlanNode {
        finish(&self.union_all, node, PlanNode::UnionAll)
    }

    pub(super) fn finish_group_by(&self, node: GroupBy) -> PlanNode {
        finish(&self.group_by, node, PlanNode::GroupBy)
    }

    pub(super) fn finish_expression(&self, expr: Expression) -> Expression {
        match &self.expr {
            Some(f) => f(expr),
            None => expr,
        }
    }
}

fn finish<N>(handler: &Option<Handler<'_, N>>, node: N, wrap: fn(N) -> PlanNode) -> PlanNode {
    match handler {
        Some(f) => f(node),
        None => wrap(node),
    }
}

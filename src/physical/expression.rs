//! Physical expressions: the transformable, not-yet-resolved form.
//!
//! Function names stay strings here so rewrites can introduce or replace
//! calls freely; `materialize` resolves them against the closed function
//! table and fails on unknown names or arity.

use super::graph;
use super::transform::Transformers;
use crate::error::PlanStreamError;
use crate::exec;
use crate::exec::expression::Function;
use crate::value::{Value, VariableName};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Variable(VariableName),
    Constant(Value),
    FunctionCall { name: String, args: Vec<Expression> },
    And(Vec<Expression>),
    Or(Vec<Expression>),
}

impl Expression {
    /// Name of the field this expression produces; empty unless it is a
    /// plain variable reference.
    pub fn output_name(&self) -> VariableName {
        match self {
            Expression::Variable(name) => name.clone(),
            _ => VariableName::empty(),
        }
    }

    pub fn transform(&self, t: &Transformers<'_>) -> Expression {
        let rebuilt = match self {
            Expression::Variable(name) => Expression::Variable(name.clone()),
            Expression::Constant(value) => Expression::Constant(value.clone()),
            Expression::FunctionCall { name, args } => Expression::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|a| a.transform(t)).collect(),
            },
            Expression::And(args) => Expression::And(args.iter().map(|a| a.transform(t)).collect()),
            Expression::Or(args) => Expression::Or(args.iter().map(|a| a.transform(t)).collect()),
        };
        t.finish_expression(rebuilt)
    }

    pub fn materialize(&self) -> Result<exec::Expression, PlanStreamError> {
        Ok(match self {
            Expression::Variable(name) => exec::Expression::Variable(name.clone()),
            Expression::Constant(value) => exec::Expression::Constant(value.clone()),
            Expression::FunctionCall { name, args } => {
                let function = Function::resolve(name, args.len())?;
                let args = materialize_all(args, name)?;
                exec::Expression::Function { function, args }
            }
            Expression::And(args) => exec::Expression::And(materialize_all(args, "and")?),
            Expression::Or(args) => exec::Expression::Or(materialize_all(args, "or")?),
        })
    }

    pub fn visualize(&self) -> graph::Node {
        match self {
            Expression::Variable(name) => graph::Node::new("variable").field("name", name.as_str()),
            Expression::Constant(value) => {
                graph::Node::new("constant").field("value", value.to_string())
            }
            Expression::FunctionCall { name, args } => {
                with_args(graph::Node::new("function").field("name", name.as_str()), args)
            }
            Expression::And(args) => with_args(graph::Node::new("and"), args),
            Expression::Or(args) => with_args(graph::Node::new("or"), args),
        }
    }
}

fn materialize_all(
    args: &[Expression],
    parent: &str,
) -> Result<Vec<exec::Expression>, PlanStreamError> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.materialize().map_err(|e| {
                e.context(format_args!("couldn't materialize argument with index {i} of {parent}"))
            })
        })
        .collect()
}

fn with_args(node: graph::Node, args: &[Expression]) -> graph::Node {
    args.iter()
        .enumerate()
        .fold(node, |node, (i, arg)| node.child(format!("arg_{i}"), arg.visualize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::test_helpers::{call, int, var};
    use crate::record::Record;

    #[test]
    fn test_output_name_only_for_variables() {
        assert_eq!(var("a").output_name(), VariableName::from("a"));
        assert!(int(1).output_name().is_empty());
        assert!(call("+", vec![var("a"), int(1)]).output_name().is_empty());
    }

    #[test]
    fn test_materialize_and_evaluate() {
        let expr = call("+", vec![var("a"), int(1)]).materialize().unwrap();
        let record = Record::insert([("a", Value::Int(41))]);
        assert_eq!(expr.evaluate(&record).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_unknown_nested_function_names_position() {
        let expr = Expression::And(vec![
            call("=", vec![var("a"), int(1)]),
            call("frobnicate", vec![var("a")]),
        ]);
        let err = expr.materialize().unwrap_err();
        assert!(matches!(err, PlanStreamError::Compilation(_)));
        assert!(err.to_string().contains("argument with index 1 of and"), "{err}");
    }

    #[test]
    fn test_visualize_function() {
        let node = call("lower", vec![var("name")]).visualize();
        assert_eq!(node.name, "function");
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].0, "arg_0");
    }
}

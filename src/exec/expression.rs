//! Executable expressions.
//!
//! An executable expression is a pure function from a record to a value.
//! Function names are resolved once, at materialization, into the closed
//! [`Function`] table; evaluation never looks anything up by name.

use crate::error::PlanStreamError;
use crate::record::Record;
use crate::value::{Value, VariableName};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A compiled expression bound to record field names.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Variable(VariableName),
    Constant(Value),
    Function {
        function: Function,
        args: Vec<Expression>,
    },
    And(Vec<Expression>),
    Or(Vec<Expression>),
}

/// The closed table of scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Not,
    Lower,
    Upper,
    Coalesce,
    ToTimestamp,
}

enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Function {
    /// Resolve a function by name (case-insensitive) and check its arity.
    pub fn resolve(name: &str, arg_count: usize) -> Result<Function, PlanStreamError> {
        let function = match name.to_ascii_lowercase().as_str() {
            "=" | "==" => Function::Eq,
            "!=" | "<>" => Function::NotEq,
            "<" => Function::Lt,
            "<=" => Function::LtEq,
            ">" => Function::Gt,
            ">=" => Function::GtEq,
            "+" => Function::Add,
            "-" => Function::Sub,
            "*" => Function::Mul,
            "/" => Function::Div,
            "not" => Function::Not,
            "lower" => Function::Lower,
            "upper" => Function::Upper,
            "coalesce" => Function::Coalesce,
            "to_timestamp" => Function::ToTimestamp,
            _ => {
                return Err(PlanStreamError::Compilation(format!(
                    "unknown function {name:?}"
                )));
            }
        };
        let ok = match function.arity() {
            Arity::Exact(n) => arg_count == n,
            Arity::AtLeast(n) => arg_count >= n,
        };
        if !ok {
            return Err(PlanStreamError::Compilation(format!(
                "function {} called with {arg_count} arguments",
                function.name()
            )));
        }
        Ok(function)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Eq => "=",
            Function::NotEq => "!=",
            Function::Lt => "<",
            Function::LtEq => "<=",
            Function::Gt => ">",
            Function::GtEq => ">=",
            Function::Add => "+",
            Function::Sub => "-",
            Function::Mul => "*",
            Function::Div => "/",
            Function::Not => "not",
            Function::Lower => "lower",
            Function::Upper => "upper",
            Function::Coalesce => "coalesce",
            Function::ToTimestamp => "to_timestamp",
        }
    }

    fn arity(&self) -> Arity {
        match self {
            Function::Not | Function::Lower | Function::Upper | Function::ToTimestamp => {
                Arity::Exact(1)
            }
            Function::Coalesce => Arity::AtLeast(1),
            _ => Arity::Exact(2),
        }
    }

    fn apply(&self, args: &[Value]) -> Result<Value, PlanStreamError> {
        match self {
            Function::Eq => compare(&args[0], &args[1], |o| o == Ordering::Equal),
            Function::NotEq => compare(&args[0], &args[1], |o| o != Ordering::Equal),
            Function::Lt => compare(&args[0], &args[1], |o| o == Ordering::Less),
            Function::LtEq => compare(&args[0], &args[1], |o| o != Ordering::Greater),
            Function::Gt => compare(&args[0], &args[1], |o| o == Ordering::Greater),
            Function::GtEq => compare(&args[0], &args[1], |o| o != Ordering::Less),
            Function::Add | Function::Sub | Function::Mul | Function::Div => {
                arithmetic(*self, &args[0], &args[1])
            }
            Function::Not => match &args[0] {
                Value::Null => Ok(Value::Null),
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(type_error(self.name(), other)),
            },
            Function::Lower | Function::Upper => match &args[0] {
                Value::Null => Ok(Value::Null),
                Value::String(s) if *self == Function::Lower => Ok(Value::String(s.to_lowercase())),
                Value::String(s) => Ok(Value::String(s.to_uppercase())),
                other => Err(type_error(self.name(), other)),
            },
            Function::Coalesce => Ok(args
                .iter()
                .find(|v| !v.is_null())
                .cloned()
                .unwrap_or(Value::Null)),
            Function::ToTimestamp => match &args[0] {
                Value::Null => Ok(Value::Null),
                Value::Time(t) => Ok(Value::Time(*t)),
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|t| Value::Time(t.with_timezone(&Utc)))
                    .map_err(|e| {
                        PlanStreamError::Evaluation(format!("to_timestamp({s:?}): {e}"))
                    }),
                other => Err(type_error(self.name(), other)),
            },
        }
    }
}

fn type_error(function: &str, value: &Value) -> PlanStreamError {
    PlanStreamError::Evaluation(format!(
        "{function} is not defined for {} value {value}",
        value.type_name()
    ))
}

/// SQL comparison: NULL on either side yields NULL; ints and floats compare
/// numerically; other mixed types are an error.
fn compare(
    left: &Value,
    right: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> Result<Value, PlanStreamError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let ordering = match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Err(PlanStreamError::InternalError(
                    "numeric value without numeric view".into(),
                ));
            };
            a.total_cmp(&b)
        }
        _ if std::mem::discriminant(left) == std::mem::discriminant(right) => left.cmp(right),
        _ => {
            return Err(PlanStreamError::Evaluation(format!(
                "cannot compare {} with {}",
                left.type_name(),
                right.type_name()
            )));
        }
    };
    Ok(Value::Bool(accept(ordering)))
}

fn arithmetic(function: Function, left: &Value, right: &Value) -> Result<Value, PlanStreamError> {
    let op = function.name();
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => {
            let result = match function {
                Function::Add => a.checked_add(*b),
                Function::Sub => a.checked_sub(*b),
                Function::Mul => a.checked_mul(*b),
                _ => {
                    if *b == 0 {
                        return Err(PlanStreamError::Evaluation(format!(
                            "division by zero: {a} / {b}"
                        )));
                    }
                    a.checked_div(*b)
                }
            };
            result.map(Value::Int).ok_or_else(|| {
                PlanStreamError::Evaluation(format!("integer overflow: {a} {op} {b}"))
            })
        }
        _ => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                let culprit = if left.as_f64().is_none() { left } else { right };
                return Err(type_error(op, culprit));
            };
            let result = match function {
                Function::Add => a + b,
                Function::Sub => a - b,
                Function::Mul => a * b,
                _ => {
                    if b == 0.0 {
                        return Err(PlanStreamError::Evaluation(format!(
                            "division by zero: {a} / {b}"
                        )));
                    }
                    a / b
                }
            };
            Ok(Value::Float(result))
        }
    }
}

/// Three-valued boolean view of an operand of AND/OR.
fn as_logical(value: Value, op: &str) -> Result<Option<bool>, PlanStreamError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        other => Err(type_error(op, &other)),
    }
}

impl Expression {
    /// Evaluate against a record.
    pub fn evaluate(&self, record: &Record) -> Result<Value, PlanStreamError> {
        match self {
            Expression::Variable(name) => record.value(name).cloned().ok_or_else(|| {
                PlanStreamError::Evaluation(format!("variable {name} not found in record"))
            }),
            Expression::Constant(v) => Ok(v.clone()),
            Expression::Function { function, args } => {
                let values = args
                    .iter()
                    .map(|a| a.evaluate(record))
                    .collect::<Result<Vec<_>, _>>()?;
                function.apply(&values)
            }
            Expression::And(operands) => {
                let mut saw_null = false;
                for operand in operands {
                    match as_logical(operand.evaluate(record)?, "and")? {
                        Some(false) => return Ok(Value::Bool(false)),
                        Some(true) => {}
                        None => saw_null = true,
                    }
                }
                Ok(if saw_null { Value::Null } else { Value::Bool(true) })
            }
            Expression::Or(operands) => {
                let mut saw_null = false;
                for operand in operands {
                    match as_logical(operand.evaluate(record)?, "or")? {
                        Some(true) => return Ok(Value::Bool(true)),
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
                Ok(if saw_null { Value::Null } else { Value::Bool(false) })
            }
        }
    }
}

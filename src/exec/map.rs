//! Map: projects each record through a list of expressions.

use super::{ExecutionContext, Expression, Operator};
use crate::error::PlanStreamError;
use crate::record::Record;
use crate::value::VariableName;

pub struct Map {
    source: Box<dyn Operator>,
    expressions: Vec<Expression>,
    names: Vec<VariableName>,
}

impl Map {
    pub fn new(
        source: Box<dyn Operator>,
        expressions: Vec<Expression>,
        names: Vec<VariableName>,
    ) -> Result<Self, PlanStreamError> {
        if expressions.len() != names.len() {
            return Err(PlanStreamError::Compilation(format!(
                "map has {} expressions but {} output names",
                expressions.len(),
                names.len()
            )));
        }
        Ok(Map {
            source,
            expressions,
            names,
        })
    }
}

impl Operator for Map {
    fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        ctx.check_cancelled("map")?;
        let Some(record) = self.source.next(ctx)? else {
            return Ok(None);
        };
        let values = self
            .expressions
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                expr.evaluate(&record).map_err(|e| {
                    e.context(format_args!("couldn't evaluate map expression with index {i}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Record::new(
            self.names.clone(),
            values,
            record.event_kind(),
        )))
    }
}

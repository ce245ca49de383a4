//! UnionAll: round-robin merge of its children.
//!
//! Each call pulls from the next live child in turn; exhausted children are
//! dropped. Nothing is buffered.

use super::{ExecutionContext, Operator};
use crate::error::PlanStreamError;
use crate::record::Record;

pub struct UnionAll {
    children: Vec<Box<dyn Operator>>,
    cursor: usize,
}

impl UnionAll {
    pub fn new(children: Vec<Box<dyn Operator>>) -> Self {
        UnionAll {
            children,
            cursor: 0,
        }
    }
}

impl Operator for UnionAll {
    fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        while !self.children.is_empty() {
            ctx.check_cancelled("union all")?;
            let i = self.cursor % self.children.len();
            match self.children[i]
                .next(ctx)
                .map_err(|e| e.context(format_args!("couldn't pull union all child with index {i}")))?
            {
                Some(record) => {
                    self.cursor = i + 1;
                    return Ok(Some(record));
                }
                None => {
                    self.children.remove(i);
                    self.cursor = i;
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Replay;
    use crate::value::Value;

    fn one(v: i64) -> Record {
        Record::insert([("v", Value::Int(v))])
    }

    #[test]
    fn test_round_robin_until_all_exhausted() {
        let mut union = UnionAll::new(vec![
            Box::new(Replay::new(vec![one(1), one(2), one(3)])),
            Box::new(Replay::new(vec![])),
            Box::new(Replay::new(vec![one(10)])),
        ]);
        let ctx = ExecutionContext::default();
        let mut seen = Vec::new();
        while let Some(r) = union.next(&ctx).unwrap() {
            seen.push(r.values()[0].clone());
        }
        assert_eq!(
            seen,
            vec![Value::Int(1), Value::Int(10), Value::Int(2), Value::Int(3)]
        );
    }
}

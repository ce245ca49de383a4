//! Multiset of the values an accumulator currently holds.

use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct LiveValues {
    multiplicity: HashMap<Value, usize>,
    len: usize,
}

impl LiveValues {
    /// Total number of live copies.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn multiplicity(&self, value: &Value) -> usize {
        self.multiplicity.get(value).copied().unwrap_or(0)
    }

    /// Add one copy, returning the new multiplicity.
    pub fn insert(&mut self, value: &Value) -> usize {
        self.len += 1;
        match self.multiplicity.get_mut(value) {
            Some(n) => {
                *n += 1;
                *n
            }
            None => {
                self.multiplicity.insert(value.clone(), 1);
                1
            }
        }
    }

    /// Remove one copy, returning the remaining multiplicity, or `None`
    /// when the value is not live.
    pub fn remove(&mut self, value: &Value) -> Option<usize> {
        let n = self.multiplicity.get_mut(value)?;
        *n -= 1;
        let left = *n;
        if left == 0 {
            self.multiplicity.remove(value);
        }
        self.len -= 1;
        Some(left)
    }
}

//! Plan metadata: cardinality class and leading-key hint.
//!
//! Metadata is recomputed from the tree on every call and never cached, so
//! it cannot go stale after a transform.

use crate::value::VariableName;
use std::fmt;

/// Safety classification of a node's output size.
///
/// Ordered from most to least restrictive for downstream operators that
/// need to hold their whole input; combining takes the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cardinality {
    BoundedFitsInLocalStorage,
    BoundedDoesNotFitInLocalStorage,
    Unbounded,
}

impl Cardinality {
    pub fn combine(self, other: Cardinality) -> Cardinality {
        self.max(other)
    }

    pub fn is_bounded(self) -> bool {
        self != Cardinality::Unbounded
    }

    pub fn name(self) -> &'static str {
        match self {
            Cardinality::BoundedFitsInLocalStorage => "bounded_fits_in_local_storage",
            Cardinality::BoundedDoesNotFitInLocalStorage => "bounded_does_not_fit_in_local_storage",
            Cardinality::Unbounded => "unbounded",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMetadata {
    cardinality: Cardinality,
    /// Field the output is ordered or keyed by; empty when there is none.
    leading_key: VariableName,
}

impl NodeMetadata {
    pub fn new(cardinality: Cardinality, leading_key: VariableName) -> Self {
        NodeMetadata {
            cardinality,
            leading_key,
        }
    }

    pub fn without_leading_key(cardinality: Cardinality) -> Self {
        NodeMetadata::new(cardinality, VariableName::empty())
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn leading_key(&self) -> &VariableName {
        &self.leading_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_takes_most_restrictive() {
        use Cardinality::*;
        assert_eq!(BoundedFitsInLocalStorage.combine(Unbounded), Unbounded);
        assert_eq!(
            BoundedDoesNotFitInLocalStorage.combine(BoundedFitsInLocalStorage),
            BoundedDoesNotFitInLocalStorage
        );
        assert!(!Unbounded.is_bounded());
        assert!(BoundedDoesNotFitInLocalStorage.is_bounded());
    }
}

//! Definition of the scope module
//!
//! A `Scope` is the domain of a `Factor`: a strictly increasing list of variable ids together
//! with the number of states of each of those variables.

use crate::strides::{FlatIndex, Strides};
use crate::util::{FactorError, Result};

use itertools::Itertools;

use std::cmp::Ordering;

/// Identifies a random variable. Callers are responsible for a consistent numbering across all
/// of the factors of a network.
pub type VariableId = usize;

/// Check that `domain` is strictly increasing, i.e. sorted and free of duplicates
pub fn is_sorted(domain: &[VariableId]) -> bool {
    domain.iter().tuple_windows().all(|(a, b)| a < b)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    /// The variables, strictly increasing
    domain: Vec<VariableId>,

    /// `cardinality[i]` is the number of states of `domain[i]`
    cardinality: Vec<usize>
}

/// Which operand of a `Scope::join` a variable of the joined scope came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Only in the left scope
    Left,

    /// Only in the right scope
    Right,

    /// In both scopes, with the same cardinality
    Shared
}

/// The result of merging two scopes.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeJoin {
    /// The union of both scopes
    pub scope: Scope,

    /// For each variable of `scope`, where it came from
    pub origin: Vec<Origin>,

    /// For each variable of `scope`, the stride of that variable in the left operand's table.
    /// Variables that only belong to the right operand have a stride of zero.
    pub left_strides: Vec<usize>
}


impl Scope {

    /// The empty scope of a scalar `Factor`
    pub fn empty() -> Self {
        Scope::default()
    }


    /// Create a new `Scope`
    ///
    /// # Errors
    /// * `FactorError::InvalidDomain` if the domain is not strictly increasing, if the lengths of
    ///   `domain` and `cardinality` differ, or if any cardinality is zero
    pub fn new(domain: Vec<VariableId>, cardinality: Vec<usize>) -> Result<Self> {
        if domain.len() != cardinality.len() {
            return Err(FactorError::InvalidDomain(format!(
                "domain has {} variables but {} cardinalities were given",
                domain.len(),
                cardinality.len()
            )));
        }

        if !is_sorted(&domain) {
            return Err(FactorError::InvalidDomain(format!(
                "domain {:?} is not strictly increasing",
                domain
            )));
        }

        if let Some(pos) = cardinality.iter().position(|&c| c == 0) {
            return Err(FactorError::InvalidDomain(format!(
                "variable {} has a cardinality of zero",
                domain[pos]
            )));
        }

        let scope = Scope { domain, cardinality };
        scope.table_len()?;

        Ok(scope)
    }

    pub fn domain(&self) -> &[VariableId] {
        &self.domain
    }

    pub fn cardinality(&self) -> &[usize] {
        &self.cardinality
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }


    /// The number of entries of a table over this scope. The empty scope has a single entry.
    ///
    /// # Errors
    /// * `FactorError::InvalidDomain` if the number of entries does not fit in a `usize`
    pub fn table_len(&self) -> Result<usize> {
        self.cardinality
            .iter()
            .try_fold(1usize, |len, &c| len.checked_mul(c))
            .ok_or_else(|| FactorError::InvalidDomain(format!(
                "a table over {:?} with cardinalities {:?} is too large",
                self.domain,
                self.cardinality
            )))
    }


    /// Position of `var` in the domain
    pub fn position(&self, var: VariableId) -> Option<usize> {
        self.domain.binary_search(&var).ok()
    }


    /// Number of states of `var`, if it is part of this scope
    pub fn cardinality_of(&self, var: VariableId) -> Option<usize> {
        self.position(var).map(|i| self.cardinality[i])
    }

    pub fn contains(&self, var: VariableId) -> bool {
        self.position(var).is_some()
    }

    pub fn strides(&self) -> Strides {
        Strides::new(&self.cardinality)
    }


    /// A copy of this scope with the variable at `position` removed
    pub fn without(&self, position: usize) -> Scope {
        let mut domain = self.domain.clone();
        let mut cardinality = self.cardinality.clone();
        domain.remove(position);
        cardinality.remove(position);

        Scope { domain, cardinality }
    }


    /// Check a full assignment (in domain order) against this scope and map it to its offset in
    /// the flat table.
    ///
    /// # Errors
    /// * `FactorError::DomainMismatch` if the assignment does not have one state per variable
    /// * `FactorError::InvalidState` if a state is out of range
    pub fn flat_index(&self, assignment: &[usize]) -> Result<FlatIndex> {
        self.check_states(assignment, 0)?;
        self.strides().index_of(assignment)
    }


    /// Check that every state of `assignment` from position `from` onwards is in range
    pub(crate) fn check_states(&self, assignment: &[usize], from: usize) -> Result<()> {
        if assignment.len() != self.len() {
            return Err(FactorError::DomainMismatch(format!(
                "assignment has {} states but the domain has {} variables",
                assignment.len(),
                self.len()
            )));
        }

        for i in from..self.len() {
            if assignment[i] >= self.cardinality[i] {
                return Err(FactorError::InvalidState {
                    variable: self.domain[i],
                    state: assignment[i],
                    cardinality: self.cardinality[i]
                });
            }
        }

        Ok(())
    }


    /// Merge this scope with `other`, in the manner of merging two sorted lists.
    ///
    /// The joined scope holds every variable of either operand in increasing order. Alongside it
    /// comes, for each variable, its origin and its stride into a table over `self`, so that a
    /// table over `self` can be broadcast onto the joined scope.
    ///
    /// # Errors
    /// * `FactorError::DomainMismatch` if a variable appears in both scopes with different
    ///   cardinalities
    /// * `FactorError::InvalidDomain` if a table over the joined scope would be too large
    pub fn join(&self, other: &Scope) -> Result<ScopeJoin> {
        let strides = self.strides();
        let capacity = self.len() + other.len();

        let mut domain = Vec::with_capacity(capacity);
        let mut cardinality = Vec::with_capacity(capacity);
        let mut origin = Vec::with_capacity(capacity);
        let mut left_strides = Vec::with_capacity(capacity);

        let (mut n1, mut n2) = (0, 0);
        loop {
            let next = match (self.domain.get(n1), other.domain.get(n2)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break
            };

            match next {
                Ordering::Less => {
                    domain.push(self.domain[n1]);
                    cardinality.push(self.cardinality[n1]);
                    origin.push(Origin::Left);
                    left_strides.push(strides[n1]);
                    n1 += 1;
                },
                Ordering::Greater => {
                    domain.push(other.domain[n2]);
                    cardinality.push(other.cardinality[n2]);
                    origin.push(Origin::Right);
                    left_strides.push(0);
                    n2 += 1;
                },
                Ordering::Equal => {
                    if self.cardinality[n1] != other.cardinality[n2] {
                        return Err(FactorError::DomainMismatch(format!(
                            "variable {} has cardinality {} and {}",
                            self.domain[n1],
                            self.cardinality[n1],
                            other.cardinality[n2]
                        )));
                    }

                    domain.push(self.domain[n1]);
                    cardinality.push(self.cardinality[n1]);
                    origin.push(Origin::Shared);
                    left_strides.push(strides[n1]);
                    n1 += 1;
                    n2 += 1;
                }
            }
        }

        let scope = Scope { domain, cardinality };
        scope.table_len()?;

        Ok(ScopeJoin {
            scope,
            origin,
            left_strides
        })
    }

}


#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn sorted() {
        assert!(is_sorted(&[]));
        assert!(is_sorted(&[4]));
        assert!(is_sorted(&[0, 1, 5, 9]));
        assert!(!is_sorted(&[0, 2, 1]));
        assert!(!is_sorted(&[0, 1, 1, 2]));
    }

    #[test]
    fn new_errs() {
        match Scope::new(vec![0, 1], vec![2]).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        match Scope::new(vec![1, 0], vec![2, 2]).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        match Scope::new(vec![3, 3], vec![2, 2]).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        match Scope::new(vec![0], vec![0]).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    /// A table whose length does not fit in a `usize` is rejected instead of wrapping around
    fn table_len_overflow() {
        match Scope::new(vec![0, 1], vec![usize::MAX, 2]).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        let left = Scope::new(vec![0], vec![usize::MAX / 2 + 1]).expect("Unexpected error");
        let right = Scope::new(vec![1], vec![4]).expect("Unexpected error");
        assert_eq!(Ok(usize::MAX / 2 + 1), left.table_len());

        match left.join(&right).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn lookups() {
        let scope = Scope::new(vec![2, 5, 7], vec![3, 2, 4]).expect("Unexpected error");

        assert_eq!(Ok(24), scope.table_len());
        assert_eq!(Some(1), scope.position(5));
        assert_eq!(None, scope.position(4));
        assert_eq!(Some(4), scope.cardinality_of(7));
        assert!(!scope.contains(0));

        let smaller = scope.without(1);
        assert_eq!(&[2, 7], smaller.domain());
        assert_eq!(&[3, 4], smaller.cardinality());

        assert_eq!(Ok(1), Scope::empty().table_len());
    }

    #[test]
    fn flat_index_errs() {
        let scope = Scope::new(vec![0, 1], vec![2, 3]).expect("Unexpected error");

        assert_eq!(5, scope.flat_index(&[1, 2]).expect("Unexpected error").get());

        match scope.flat_index(&[1]).expect_err("missing error") {
            FactorError::DomainMismatch(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        assert_eq!(
            FactorError::InvalidState { variable: 1, state: 3, cardinality: 3 },
            scope.flat_index(&[0, 3]).expect_err("missing error")
        );
    }

    #[test]
    fn join_interleaved() {
        let left = Scope::new(vec![0, 2, 4], vec![2, 3, 2]).expect("Unexpected error");
        let right = Scope::new(vec![1, 2, 5], vec![4, 3, 2]).expect("Unexpected error");

        let join = left.join(&right).expect("Unexpected error");

        assert_eq!(&[0, 1, 2, 4, 5], join.scope.domain());
        assert_eq!(&[2, 4, 3, 2, 2], join.scope.cardinality());
        assert_eq!(
            vec![Origin::Left, Origin::Right, Origin::Shared, Origin::Left, Origin::Right],
            join.origin
        );
        assert_eq!(vec![1, 0, 2, 6, 0], join.left_strides);
    }

    #[test]
    fn join_empty() {
        let left = Scope::empty();
        let right = Scope::new(vec![3], vec![2]).expect("Unexpected error");

        let join = left.join(&right).expect("Unexpected error");
        assert_eq!(right, join.scope);
        assert_eq!(vec![0], join.left_strides);

        let join = right.join(&left).expect("Unexpected error");
        assert_eq!(right, join.scope);
        assert_eq!(vec![Origin::Left], join.origin);
        assert_eq!(vec![1], join.left_strides);
    }

    #[test]
    fn join_cardinality_mismatch() {
        let left = Scope::new(vec![0, 1], vec![2, 2]).expect("Unexpected error");
        let right = Scope::new(vec![1], vec![3]).expect("Unexpected error");

        match left.join(&right).expect_err("missing error") {
            FactorError::DomainMismatch(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }
}

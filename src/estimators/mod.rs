//! Defines an `Estimator`, which is used to estimate the parameters of CPDs from a dataset.

use crate::scope::VariableId;
use crate::util::{FactorError, Result};

use std::collections::HashSet;

mod mle;
pub use self::mle::LocalMLEstimator;
pub use self::mle::ModelMLEstimator;

/// A trait that represents the ability to estimate the parameters of some model (be it a
/// collection of CPDs or just a local CPD).
pub trait Estimator<T> {

    /// Estimate the value of the parameters from the given dataset
    fn estimate(&mut self, dataset: &Dataset) -> Result<T>;

}


/// Fully observed data: one column per variable, one state per column in every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    /// The variable of each column, in any order
    domain: Vec<VariableId>,

    rows: Vec<Vec<usize>>
}

impl Dataset {

    /// Create a new `Dataset`
    ///
    /// # Errors
    /// * `FactorError::InvalidDomain` if a variable names more than one column
    /// * `FactorError::DomainMismatch` if a row does not have one state per column
    pub fn new(domain: Vec<VariableId>, rows: Vec<Vec<usize>>) -> Result<Self> {
        let distinct: HashSet<&VariableId> = domain.iter().collect();
        if distinct.len() != domain.len() {
            return Err(FactorError::InvalidDomain(format!(
                "dataset columns {:?} contain duplicates",
                domain
            )));
        }

        let mut dataset = Dataset { domain, rows: Vec::with_capacity(rows.len()) };
        for row in rows {
            dataset.push(row)?;
        }

        Ok(dataset)
    }

    /// Append a row
    pub fn push(&mut self, row: Vec<usize>) -> Result<()> {
        if row.len() != self.domain.len() {
            return Err(FactorError::DomainMismatch(format!(
                "row has {} states but the dataset has {} columns",
                row.len(),
                self.domain.len()
            )));
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn domain(&self) -> &[VariableId] {
        &self.domain
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

}


#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn dataset() {
        let mut d = Dataset::new(vec![3, 1], vec![vec![0, 1], vec![1, 1]]).unwrap();
        assert_eq!(2, d.len());
        assert_eq!(&[3, 1], d.domain());

        d.push(vec![2, 0]).unwrap();
        assert_eq!(&[2, 0], d.rows()[2].as_slice());

        match d.push(vec![0]).expect_err("missing error") {
            FactorError::DomainMismatch(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn dataset_errs() {
        match Dataset::new(vec![0, 0], vec![]).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        match Dataset::new(vec![0, 1], vec![vec![0, 0, 0]]).expect_err("missing error") {
            FactorError::DomainMismatch(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        assert!(Dataset::new(vec![], vec![]).unwrap().is_empty());
    }
}

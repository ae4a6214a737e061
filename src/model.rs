//! Defines how a network hands its factors to the engine.
//!
//! A `FactorSource` visits factors, one per node of a Bayesian network for a `DirectedFactors`.
//! How the factors were generated (graph traversal, file I/O, ...) is up to the source.

use crate::factor::Factor;
use crate::scope::VariableId;
use crate::util::{FactorError, Result};

use indexmap::IndexMap;
use log::debug;

/// Anything that can hand a sequence of `Factor`s to a visitor.
pub trait FactorSource {

    /// Call `visitor` on every factor in order, stopping at the first error
    fn visit_factors(&self, visitor: &mut dyn FnMut(&Factor) -> Result<()>) -> Result<()>;

}

impl FactorSource for [Factor] {

    fn visit_factors(&self, visitor: &mut dyn FnMut(&Factor) -> Result<()>) -> Result<()> {
        for f in self {
            visitor(f)?;
        }

        Ok(())
    }

}

impl FactorSource for Vec<Factor> {

    fn visit_factors(&self, visitor: &mut dyn FnMut(&Factor) -> Result<()>) -> Result<()> {
        self.as_slice().visit_factors(visitor)
    }

}


/// The product of every factor of `source`, the identity if there are none
pub fn joint<S: FactorSource + ?Sized>(source: &S) -> Result<Factor> {
    let mut product = Factor::identity();
    source.visit_factors(&mut |f| {
        product = product.multiply(f)?;
        Ok(())
    })?;

    Ok(product)
}


/// The CPDs of a Bayesian network, one per variable, keyed by their child variable and kept in
/// insertion order.
#[derive(Clone, Debug, Default)]
pub struct DirectedFactors {
    /// child variable -> P(child | parents)
    cpds: IndexMap<VariableId, Factor>,

    /// cardinality of every variable mentioned by any CPD
    cardinalities: IndexMap<VariableId, usize>
}


impl DirectedFactors {

    pub fn new() -> Self {
        DirectedFactors::default()
    }


    /// Build from `(domain, cardinality, table)` triples, each the CPD of its `domain[0]`
    pub fn from_triples<I>(triples: I) -> Result<Self>
        where I: IntoIterator<Item = (Vec<VariableId>, Vec<usize>, Vec<f64>)>
    {
        let mut factors = DirectedFactors::new();
        for (domain, cardinality, table) in triples {
            factors.insert(Factor::new(domain, cardinality, table)?)?;
        }

        Ok(factors)
    }


    /// Add the CPD of its child variable
    ///
    /// # Errors
    /// * `FactorError::EmptyDomain` if `cpd` has no child variable
    /// * `FactorError::InvalidDomain` if the child already has a CPD
    /// * `FactorError::DomainMismatch` if a variable's cardinality disagrees with an earlier CPD
    pub fn insert(&mut self, cpd: Factor) -> Result<()> {
        let child = cpd.child().ok_or(FactorError::EmptyDomain)?;
        if self.cpds.contains_key(&child) {
            return Err(FactorError::InvalidDomain(format!("variable {} already has a CPD", child)));
        }

        for (&v, &c) in cpd.domain().iter().zip(cpd.cardinality()) {
            match self.cardinalities.get(&v) {
                Some(&known) if known != c => {
                    return Err(FactorError::DomainMismatch(format!(
                        "variable {} has cardinality {} and {}",
                        v,
                        known,
                        c
                    )));
                },
                _ => ()
            }
        }

        for (&v, &c) in cpd.domain().iter().zip(cpd.cardinality()) {
            self.cardinalities.insert(v, c);
        }

        debug!("CPD for {} with parents {:?}", child, cpd.parents());
        self.cpds.insert(child, cpd);

        Ok(())
    }

    pub fn cpd(&self, var: VariableId) -> Option<&Factor> {
        self.cpds.get(&var)
    }

    pub fn cardinality_of(&self, var: VariableId) -> Option<usize> {
        self.cardinalities.get(&var).cloned()
    }

    /// The variables that have a CPD, in insertion order
    pub fn variables<'a>(&'a self) -> impl Iterator<Item = VariableId> + 'a {
        self.cpds.keys().cloned()
    }

    pub fn len(&self) -> usize {
        self.cpds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpds.is_empty()
    }


    /// Determine the probability of a full assignment, the product of every CPD's value.
    ///
    /// # Args
    /// * `domain`: the variable of each state of `states`, in any order
    /// * `states`: the assignment
    ///
    /// # Errors
    /// * `FactorError::VariableNotFound` if a variable of some CPD is not assigned
    pub fn probability(&self, domain: &[VariableId], states: &[usize]) -> Result<f64> {
        if domain.len() != states.len() {
            return Err(FactorError::DomainMismatch(format!(
                "{} variables but {} states",
                domain.len(),
                states.len()
            )));
        }

        let mut p = 1.0;
        for cpd in self.cpds.values() {
            let assignment = cpd.domain()
                                .iter()
                                .map(|&v| {
                                    domain.iter()
                                          .position(|&d| d == v)
                                          .map(|i| states[i])
                                          .ok_or(FactorError::VariableNotFound(v))
                                })
                                .collect::<Result<Vec<usize>>>()?;

            p *= cpd.value(&assignment)?;
        }

        Ok(p)
    }

}

impl FactorSource for DirectedFactors {

    fn visit_factors(&self, visitor: &mut dyn FnMut(&Factor) -> Result<()>) -> Result<()> {
        for f in self.cpds.values() {
            visitor(f)?;
        }

        Ok(())
    }

}


#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// A fair coin (variable 1) and the distribution of variable 0 given the coin
    fn coin_model() -> DirectedFactors {
        DirectedFactors::from_triples(vec![
            (vec![1], vec![2], vec![0.5, 0.5]),
            (vec![0, 1], vec![2, 2], vec![0.9, 0.1, 0.2, 0.8])
        ]).unwrap()
    }

    #[test]
    fn coin_marginal() {
        let model = coin_model();
        assert_eq!(vec![1, 0], model.variables().collect::<Vec<_>>());
        assert_eq!(Some(2), model.cardinality_of(0));

        let marginal = joint(&model).unwrap().marginalize(1).unwrap();
        assert_eq!(&[0], marginal.domain());
        assert!((0.55 - marginal.table()[0]).abs() < 1e-12);
        assert!((0.45 - marginal.table()[1]).abs() < 1e-12);
    }

    #[test]
    fn joint_of_slices() {
        let factors: Vec<Factor> = Vec::new();
        assert!(joint(&factors).unwrap().is_identity());

        let factors = vec![
            Factor::new(vec![0], vec![2], vec![0.5, 0.5]).unwrap(),
            Factor::new(vec![1], vec![3], vec![0.2, 0.2, 0.6]).unwrap()
        ];
        let j = joint(factors.as_slice()).unwrap();
        assert_eq!(&[0, 1], j.domain());
        assert!((1. - j.sum()).abs() < 1e-12);
        assert!((0.3 - j.value(&[1, 2]).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn probability() {
        let model = coin_model();

        // P(1 = 1) * P(0 = 0 | 1 = 1)
        assert!((0.5 * 0.2 - model.probability(&[1, 0], &[1, 0]).unwrap()).abs() < 1e-12);

        match model.probability(&[1], &[0]).expect_err("missing error") {
            FactorError::VariableNotFound(v) => assert_eq!(0, v),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn insert_errs() {
        let mut model = coin_model();

        match model.insert(Factor::new(vec![1], vec![2], vec![0.5, 0.5]).unwrap()).expect_err("missing error") {
            FactorError::InvalidDomain(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        model.insert(Factor::new(vec![2, 3], vec![2, 3], vec![0.5; 6]).unwrap()).unwrap();

        // variable 3 was registered with cardinality 3
        match model.insert(Factor::new(vec![3, 4], vec![2, 2], vec![0.5; 4]).unwrap()).expect_err("missing error") {
            FactorError::DomainMismatch(_) => assert!(true),
            _ => panic!("wrong error type")
        };

        // a rejected CPD leaves the model untouched
        assert_eq!(3, model.len());
        assert!(model.cpd(3).is_none());
        assert_eq!(None, model.cardinality_of(4));
        assert_eq!(Some(3), model.cardinality_of(3));

        assert_eq!(
            FactorError::EmptyDomain,
            model.insert(Factor::identity()).expect_err("missing error")
        );
    }
}

//! Defines `Estimator`s that use Maximum Likelihood Estimation to estimate the value of parameters
//! given a dataset.

use crate::factor::Factor;
use crate::model::DirectedFactors;
use crate::util::{FactorError, Result};
use super::{Dataset, Estimator};

use log::debug;

/// Defines the `LocalMLEstimator`, a Maximum Likelihood `Estimator` for the Conditional Probability
/// Distribution of a single variable in a Bayesian framework.
///
/// Implementation of the MLE Parameter Estimation scheme for conditional probability distributions
/// described in Koller & Friedman Section 17.2
pub struct LocalMLEstimator {

    /// The CPD whose scope is estimated. Its values are never read.
    factor: Factor

}


impl LocalMLEstimator {

    /// Construct an ML estimator for the given factor
    pub fn new(factor: &Factor) -> Result<Self> {
        if factor.domain().is_empty() {
            return Err(FactorError::EmptyDomain);
        }

        Ok(LocalMLEstimator { factor: factor.clone() })
    }

}


impl Estimator<Factor> for LocalMLEstimator {

    fn estimate(&mut self, dataset: &Dataset) -> Result<Factor> {
        // each call to estimate must be independent, so fit a fresh copy
        let mut factor = self.factor.clone();
        factor.maximum_likelihood_estimate(dataset.domain(), dataset.rows())?;

        Ok(factor)
    }

}


/// A Maximium Likelihood estimator for a `DirectedFactors`
///
/// Based on the decomposability of the likelihood function, each CPD can be estimated separately
/// and therefore the `ModelMLEstimator` is really just a 'bag-o-`LocalMLEstimator`s'
pub struct ModelMLEstimator {

    /// The `Estimator` for each local CPD, in the order of the model
    estimators: Vec<LocalMLEstimator>

}


impl ModelMLEstimator {

    pub fn new(model: &DirectedFactors) -> Result<Self> {
        let estimators = model.variables()
                              .filter_map(|v| model.cpd(v))
                              .map(LocalMLEstimator::new)
                              .collect::<Result<Vec<_>>>()?;

        Ok(ModelMLEstimator { estimators })
    }

}


impl Estimator<DirectedFactors> for ModelMLEstimator {

    fn estimate(&mut self, dataset: &Dataset) -> Result<DirectedFactors> {
        debug!("estimating {} CPDs from {} rows", self.estimators.len(), dataset.len());

        let mut fitted = DirectedFactors::new();
        for estimator in self.estimators.iter_mut() {
            fitted.insert(estimator.estimate(dataset)?)?;
        }

        Ok(fitted)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::init::Initialization;
    use std::iter::repeat;
    use test_log::test;

    #[test]
    /// Test MLE of a single, binary variable (a weighted coin)
    fn coin_toss() {
        let f = Initialization::Binomial(0.5).build_cpd((0, 2), &[]).unwrap();

        let rows: Vec<Vec<usize>> = repeat(vec![0]).take(30).chain(repeat(vec![1]).take(70)).collect();
        let dataset = Dataset::new(vec![0], rows).unwrap();

        let mut estimator = LocalMLEstimator::new(&f).unwrap();
        let factor = estimator.estimate(&dataset).unwrap();

        assert_eq!(0.3, factor.value(&[0]).unwrap());
        assert_eq!(0.7, factor.value(&[1]).unwrap());
        assert!(factor.is_cpd());

        // the estimator does not keep state between calls
        let dataset = Dataset::new(vec![0], vec![vec![1]; 10]).unwrap();
        let factor = estimator.estimate(&dataset).unwrap();
        assert_eq!(vec![0., 1.], factor.table().to_vec());
    }

    #[test]
    /// Test X (multinomial, variable 1) -> Y (binomial, variable 0) factor
    ///
    /// CPT:
    ///    | y0 | y1
    /// ---+----+----
    /// x0 | .8 | .2
    /// ---+---------
    /// x1 | .5 | .5
    /// ---+----+----
    /// x2 | .3 | .7
    fn one_parent_discrete_binary() {
        let f = Initialization::Uniform.build_cpd((0, 2), &[(1, 3)]).unwrap();

        // columns are (x, y)
        let rows: Vec<Vec<usize>> = repeat(vec![0, 0]).take(80)
                                        .chain(repeat(vec![0, 1]).take(20))
                                        .chain(repeat(vec![1, 0]).take(500))
                                        .chain(repeat(vec![1, 1]).take(500))
                                        .chain(repeat(vec![2, 0]).take(3))
                                        .chain(repeat(vec![2, 1]).take(7))
                                        .collect();
        let dataset = Dataset::new(vec![1, 0], rows).unwrap();

        let mut estimator = LocalMLEstimator::new(&f).unwrap();
        let factor = estimator.estimate(&dataset).unwrap();
        assert!(factor.is_cpd());

        let expected = vec![0.8, 0.2, 0.5, 0.5, 0.3, 0.7];
        assert_eq!(expected, factor.table().to_vec());
    }

    #[test]
    fn missing_column() {
        let f = Initialization::Uniform.build_cpd((0, 2), &[(1, 3)]).unwrap();
        let dataset = Dataset::new(vec![0, 2], vec![vec![0, 0]]).unwrap();

        let mut estimator = LocalMLEstimator::new(&f).unwrap();
        assert_eq!(FactorError::VariableNotFound(1), estimator.estimate(&dataset).expect_err("missing error"));

        assert!(LocalMLEstimator::new(&Factor::identity()).is_err());
    }

    #[test]
    /// Test X (binomial, variable 1) -> Y (binomial, variable 0) model
    ///
    /// CPT X:
    /// x0 | .3
    /// x1 | .7
    ///
    /// CPT Y:
    ///    | y0 | y1
    /// ---+----+----
    /// x0 | .8 | .2
    /// ---+---------
    /// x1 | .5 | .5
    ///
    /// Assuming 1000 samples:
    ///     x0: 300
    ///         y0: 300 * .8 = 240
    ///         y1: 300 * .2 = 60
    ///     x1: 700
    ///         y0: 700 * .5 = 350
    ///         y1: 350 * .5 = 350
    fn one_parent_model() {
        let mut model = DirectedFactors::new();
        model.insert(Initialization::Binomial(0.5).build_cpd((1, 2), &[]).unwrap()).unwrap();
        model.insert(Initialization::Uniform.build_cpd((0, 2), &[(1, 2)]).unwrap()).unwrap();

        // columns are (y, x)
        let rows: Vec<Vec<usize>> = repeat(vec![0, 0]).take(240)
                                        .chain(repeat(vec![1, 0]).take(60))
                                        .chain(repeat(vec![0, 1]).take(350))
                                        .chain(repeat(vec![1, 1]).take(350))
                                        .collect();
        let dataset = Dataset::new(vec![0, 1], rows).unwrap();

        let mut estimator = ModelMLEstimator::new(&model).unwrap();
        let fitted = estimator.estimate(&dataset).unwrap();

        assert_eq!(vec![1, 0], fitted.variables().collect::<Vec<_>>());

        let expected = vec![0.3 * 0.8, 0.3 * 0.2, 0.7 * 0.5, 0.7 * 0.5];
        let assignments = vec![[0, 0], [0, 1], [1, 0], [1, 1]];
        for (e, &[x, y]) in expected.iter().zip(assignments.iter()) {
            let actual = fitted.probability(&[0, 1], &[y, x]).unwrap();
            assert!((e - actual).abs() < 1e-12);
        }
    }
}

//! Module containing initialization routines for the table of a conditional probability
//! distribution.

use crate::factor::{Factor, Table};
use crate::scope::VariableId;
use crate::util::{FactorError, Result};

use ndarray_rand::RandomExt;
use rand::distributions::Range;

/// Defines possible ways to initialize a CPD.
pub enum Initialization<'a> {
    /// A uniform distribution over the child's states, for every assignment to the parents
    Uniform,

    /// Randomly initialize the weights of the CPD.
    Random,

    /// Initialize the CPD as a Binomial distribution with parameter ```p```.
    /// Note that this `Initialization` is valid only to a binary variable with no parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a variable with no parents.
    Multinomial(&'a [f64]),

    /// User defined CPD
    Table(Factor)
}


impl<'a> Initialization<'a> {

    /// Construct a CPD, initialized based on ```self```
    ///
    /// # Args
    /// * `child`: the child variable and its cardinality
    /// * `parents`: the parent variables and their cardinalities, strictly increasing and all
    ///   with a larger id than the child
    ///
    /// # Returns
    /// a `Factor` over the child and its parents whose child blocks each sum to 1
    ///
    /// # Errors
    /// * `FactorError::InvalidInitialization` if `self` does not fit the given variables
    /// * any error of `Factor::cpd`
    pub fn build_cpd(self, child: (VariableId, usize), parents: &[(VariableId, usize)]) -> Result<Factor> {
        ///////////////////////////////////////////////////////////////////////////////
        // Trivial cases

        // if this is a user defined factor, it just needs to be verified and returned
        if let Initialization::Table(f) = self {
            if !f.is_cpd() {
                return Err(FactorError::InvalidInitialization(String::from(
                    "the provided table is not a conditional probability distribution"
                )));
            }

            let expected: Vec<(VariableId, usize)> = Some(child).into_iter().chain(parents.iter().cloned()).collect();
            let actual: Vec<(VariableId, usize)> = f.domain().iter().cloned().zip(f.cardinality().iter().cloned()).collect();
            if expected != actual {
                return Err(FactorError::InvalidInitialization(format!(
                    "the provided table is over {:?}, expected {:?}",
                    actual,
                    expected
                )));
            }

            return Ok(f);
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Check for errors
        match self {
            // A binomial/multinomial on a variable with parents
            Initialization::Binomial(_) | Initialization::Multinomial(_) if !parents.is_empty() => {
                return Err(FactorError::InvalidInitialization(String::from(
                    "binomial and multinomial initializations require a variable without parents"
                )));
            },

            // A binomial distribution on a non-binary variable
            Initialization::Binomial(p) if child.1 != 2 || !(0.0..=1.0).contains(&p) => {
                return Err(FactorError::InvalidInitialization(format!(
                    "binomial({}) requires a binary variable, found cardinality {}",
                    p,
                    child.1
                )));
            },

            // A multinomial distribution with an incorrect number of parameters
            Initialization::Multinomial(ps) if ps.len() != child.1 => {
                return Err(FactorError::InvalidInitialization(format!(
                    "multinomial with {} parameters for a variable with cardinality {}",
                    ps.len(),
                    child.1
                )));
            },

            _ => ()
        }

        ///////////////////////////////////////////////////////////////////////////////
        // now, build CPD
        let len = child.1 * parents.iter().map(|&(_, c)| c).product::<usize>();
        let random = match self {
            Initialization::Random => true,
            _ => false
        };

        let values = match self {
            Initialization::Uniform => {
                // normalizing constant is just the number of child states
                vec![1. / (child.1 as f64); len]
            },
            Initialization::Random => {
                Table::random(len, Range::new(1.0, 100.0)).to_vec()
            },
            Initialization::Binomial(p) => {
                vec![p, 1.0 - p]
            },
            Initialization::Multinomial(ps) => {
                ps.to_vec()
            },
            Initialization::Table(_) => unreachable!()
        };

        let mut cpd = Factor::cpd(child, parents, values)?;
        if random {
            cpd.normalize_conditional();
        }

        if !cpd.is_cpd() {
            return Err(FactorError::InvalidInitialization(String::from(
                "the initial parameters do not form a distribution"
            )));
        }

        Ok(cpd)
    }

}

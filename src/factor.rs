//! Definition of the factor module
//!
//! A `Factor` represents a non-negative function over a `Scope` of discrete variables. Tables
//! are flat, with the first variable of the domain varying fastest (see `strides`), so for a
//! conditional probability distribution `P(X | Y1..Yk)` the child `X` sits at `CHILD_POSITION`
//! and every block of `cardinality[CHILD_POSITION]` consecutive entries holds one distribution
//! over `X`.
//!
//! Operations never modify their operands and return new `Factor`s. The exceptions are the
//! normalizations and `maximum_likelihood_estimate`, which work on the receiver's table in place.

use crate::record::FactorRecord;
use crate::scope::{Origin, Scope, VariableId, is_sorted};
use crate::strides::{Cursor, FlatIndex, Odometer, Tick};
use crate::util::{FactorError, Result, CPD_TOLERANCE, NORMALIZATION_EPSILON};

use log::{debug, trace, warn};
use ndarray::prelude as nd;
use rand::Rng;
use rand::distributions::{IndependentSample, Range};
use serde::{Deserialize, Serialize};

use std::iter;

/// Alias f64 ndarray::Array1 as Table
pub type Table = nd::Array1<f64>;

/// Position of the child variable within the domain of a conditional probability distribution
pub const CHILD_POSITION: usize = 0;


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "FactorRecord", try_from = "FactorRecord")]
pub struct Factor {
    /// The scope of the `Factor`
    scope: Scope,

    /// The values of the `Factor` table, `scope.table_len()` of them
    table: Table
}


impl Factor {

    /// Get the identity factor: the empty domain with a single value of 1
    pub fn identity() -> Self {
        Factor::scalar(1.0)
    }


    fn scalar(value: f64) -> Self {
        Factor {
            scope: Scope::empty(),
            table: Table::from_vec(vec![value])
        }
    }


    /// Create a new `Factor`
    ///
    /// # Args
    /// * `domain`: the variables of the factor, strictly increasing
    /// * `cardinality`: the number of states of each variable of `domain`
    /// * `values`: the flat table, `domain[0]` varying fastest
    ///
    /// # Errors
    /// * `FactorError::InvalidDomain` if the domain is unsorted or has duplicates, if `domain`
    ///   and `cardinality` differ in length, or if `values` does not hold exactly
    ///   `product(cardinality)` entries
    /// * `FactorError::InvalidValue` if any entry is negative or not finite
    pub fn new(domain: Vec<VariableId>, cardinality: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let scope = Scope::new(domain, cardinality)?;
        Factor::with_scope(scope, values)
    }


    /// Create a new `Factor` over an already validated `Scope`
    pub fn with_scope(scope: Scope, values: Vec<f64>) -> Result<Self> {
        let len = scope.table_len()?;
        if values.len() != len {
            return Err(FactorError::InvalidDomain(format!(
                "table has {} entries but the domain requires {}",
                values.len(),
                len
            )));
        }

        if let Some(&v) = values.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(FactorError::InvalidValue(v));
        }

        Ok(Factor { scope, table: Table::from_vec(values) })
    }


    /// Create a conditional probability distribution `P(child | parents)`.
    ///
    /// The child is placed at `CHILD_POSITION`, so its id must be smaller than every parent id
    /// for the domain to be sorted. The table is taken as given; use `is_cpd` to check it.
    ///
    /// # Args
    /// * `child`: the child variable and its cardinality
    /// * `parents`: the parent variables and their cardinalities, strictly increasing
    /// * `values`: the flat table, one block of `child` states per parent assignment
    pub fn cpd(child: (VariableId, usize), parents: &[(VariableId, usize)], values: Vec<f64>) -> Result<Self> {
        if let Some(&(first, _)) = parents.first() {
            if first <= child.0 {
                return Err(FactorError::InvalidDomain(format!(
                    "child {} must have a smaller id than its parents, found parent {}",
                    child.0,
                    first
                )));
            }
        }

        let (domain, cardinality) = iter::once(&child).chain(parents).cloned().unzip();
        Factor::new(domain, cardinality, values)
    }


    /// Check if the `Factor` is the identity `Factor`
    pub fn is_identity(&self) -> bool {
        self.scope.is_empty() && self.table[0] == 1.0
    }


    /// Check if the `Factor` is a Conditional Probability Distribution, i.e. every block of the
    /// child variable sums to 1. The identity `Factor` is considered a CPD.
    pub fn is_cpd(&self) -> bool {
        if self.scope.is_empty() {
            return self.is_identity();
        }

        let block = self.scope.cardinality()[CHILD_POSITION];
        self.table
            .axis_chunks_iter(nd::Axis(0), block)
            .all(|chunk| (chunk.scalar_sum() - 1.0).abs() <= CPD_TOLERANCE)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn domain(&self) -> &[VariableId] {
        self.scope.domain()
    }

    pub fn cardinality(&self) -> &[usize] {
        self.scope.cardinality()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }


    /// The child variable, when the `Factor` is read as a conditional distribution
    pub fn child(&self) -> Option<VariableId> {
        self.scope.domain().get(CHILD_POSITION).cloned()
    }


    /// The parent variables, when the `Factor` is read as a conditional distribution
    pub fn parents(&self) -> &[VariableId] {
        if self.scope.is_empty() {
            &[]
        } else {
            &self.scope.domain()[CHILD_POSITION + 1..]
        }
    }


    /// The sum over every entry of the table
    pub fn sum(&self) -> f64 {
        self.table.scalar_sum()
    }


    /// Retrieve the value for a full assignment over the domain of this `Factor`
    ///
    /// # Errors
    /// * `FactorError::DomainMismatch` if the assignment does not have one state per variable
    /// * `FactorError::InvalidState` if a state is out of range
    pub fn value(&self, assignment: &[usize]) -> Result<f64> {
        let idx = self.scope.flat_index(assignment)?;
        Ok(self.table[idx.get()])
    }


    /// A copy of this `Factor` with every value multiplied by `alpha`
    ///
    /// # Errors
    /// * `FactorError::InvalidValue` if `alpha` is negative or not finite
    pub fn scaled(&self, alpha: f64) -> Result<Self> {
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(FactorError::InvalidValue(alpha));
        }

        if alpha == 1.0 {
            return Ok(self.clone());
        }

        Ok(Factor {
            scope: self.scope.clone(),
            table: self.table.mapv(|v| v * alpha)
        })
    }


    /// Broadcast this `Factor` onto the union of its domain and the given one, repeating its
    /// values for every state of the variables it does not depend on. Nothing is renormalized.
    ///
    /// # Errors
    /// * `FactorError::InvalidDomain` if the given domain and cardinality are invalid
    /// * `FactorError::DomainMismatch` if a shared variable has a different cardinality
    pub fn extend_domain(&self, domain: &[VariableId], cardinality: &[usize]) -> Result<Self> {
        let other = Scope::new(domain.to_vec(), cardinality.to_vec())?;
        self.extend_to(&other)
    }


    /// Same as `extend_domain`, over an already validated `Scope`
    pub fn extend_to(&self, other: &Scope) -> Result<Self> {
        let join = self.scope.join(other)?;
        if join.scope == self.scope {
            return Ok(self.clone());
        }

        debug!("extend {:?} onto {:?}", self.scope.domain(), join.scope.domain());

        let radices = join.scope.cardinality();
        let mut values = Vec::with_capacity(join.scope.table_len()?);
        let mut odometer = Odometer::new(radices);
        let mut cursor = Cursor::new(join.left_strides, radices);

        loop {
            values.push(self.table[cursor.position().get()]);

            match odometer.increment() {
                Tick::Advanced(digit) => cursor.advance(digit),
                Tick::Overflow => break
            }
        }

        Ok(Factor { scope: join.scope, table: Table::from_vec(values) })
    }


    /// Product of this `Factor` and another, a `Factor` over the union of both domains.
    ///
    /// Defined in Koller & Friedman Section 4.2.1
    ///
    /// # Errors
    /// * `FactorError::DomainMismatch` if a shared variable has a different cardinality
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        // scalar factors scale the other operand, the identity returns it unchanged
        match (self.scope.is_empty(), other.scope.is_empty()) {
            (true, true) => return Ok(Factor::scalar(self.table[0] * other.table[0])),
            (true, false) => return other.scaled(self.table[0]),
            (false, true) => return self.scaled(other.table[0]),
            (false, false) => ()
        }

        debug!("multiply {:?} by {:?}", self.scope.domain(), other.scope.domain());

        let left = self.extend_to(&other.scope)?;
        let right = other.extend_to(&self.scope)?;
        let table = &left.table * &right.table;

        Ok(Factor { scope: left.scope, table })
    }


    /// `Factor` division, `self / other`, where the domain of `other` is a subset of the
    /// domain of `self`.
    ///
    /// Defined in Koller & Friedman Section 10.3.1
    ///
    /// # Notes
    /// In the context of this operation, 0/0 is defined as 0. However, X/0, where X != 0, is still
    /// undefined.
    ///
    /// # Errors
    /// * `FactorError::DomainMismatch` if `other` mentions a variable that `self` does not, or
    ///   with a different cardinality
    /// * `FactorError::DivideByZero` if a non-zero value is divided by zero
    pub fn divide(&self, other: &Self) -> Result<Self> {
        let join = self.scope.join(&other.scope)?;
        if join.origin.contains(&Origin::Right) {
            return Err(FactorError::DomainMismatch(format!(
                "cannot divide {:?} by {:?}, the divisor's domain must be a subset",
                self.scope.domain(),
                other.scope.domain()
            )));
        }

        let denominator = other.extend_to(&self.scope)?;

        let mut values = Vec::with_capacity(self.table.len());
        for (&n, &d) in self.table.iter().zip(denominator.table.iter()) {
            if d == 0.0 {
                if n == 0.0 {
                    values.push(0.0);
                } else {
                    return Err(FactorError::DivideByZero);
                }
            } else {
                values.push(n / d);
            }
        }

        Ok(Factor { scope: self.scope.clone(), table: Table::from_vec(values) })
    }


    /// Locate `var` and return its position, stride, cardinality and the number of blocks of
    /// `stride * cardinality` entries in the table.
    fn axis(&self, var: VariableId) -> Result<(usize, usize, usize, usize)> {
        let position = self.scope.position(var).ok_or(FactorError::VariableNotFound(var))?;
        let stride = self.scope.strides()[position];
        let cardinality = self.scope.cardinality()[position];
        let outer = self.table.len() / (stride * cardinality);

        Ok((position, stride, cardinality, outer))
    }


    /// Sum the `Factor` over the given variable, removing it from the domain.
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Errors
    /// * `FactorError::VariableNotFound` if `var` is not in the domain
    pub fn marginalize(&self, var: VariableId) -> Result<Self> {
        let (position, stride, cardinality, outer) = self.axis(var)?;
        let scope = self.scope.without(position);

        debug!("marginalize {} out of {:?}", var, self.scope.domain());

        // entries that differ only in the state of `var` are `stride` apart, and each run of
        // `stride * cardinality` entries collapses into `stride` output entries
        let mut values: Vec<f64> = Vec::with_capacity(scope.table_len()?);
        for block in 0..outer {
            let base = block * stride * cardinality;
            for low in 0..stride {
                let start = base + low;
                values.push((0..cardinality).map(|k| self.table[start + k * stride]).sum());
            }
        }

        Ok(Factor { scope, table: Table::from_vec(values) })
    }


    /// Marginalize each of the given variables, in order
    pub fn marginalize_all(&self, vars: &[VariableId]) -> Result<Self> {
        vars.iter().fold(Ok(self.clone()), |acc, &v| acc.and_then(|f| f.marginalize(v)))
    }


    /// Restrict the `Factor` to `var = state`, removing `var` from the domain. The result is not
    /// renormalized.
    ///
    /// Defined in Koller & Friedman 4.2.3
    ///
    /// # Errors
    /// * `FactorError::VariableNotFound` if `var` is not in the domain
    /// * `FactorError::InvalidState` if `state` is out of range for `var`
    pub fn condition(&self, var: VariableId, state: usize) -> Result<Self> {
        self.condition_with_evidence(var, state).map(|(f, _)| f)
    }


    /// Same as `condition`, also returning the sum of the retained entries, i.e. the
    /// unnormalized probability of the evidence.
    pub fn condition_with_evidence(&self, var: VariableId, state: usize) -> Result<(Self, f64)> {
        let (position, stride, cardinality, outer) = self.axis(var)?;
        if state >= cardinality {
            return Err(FactorError::InvalidState { variable: var, state, cardinality });
        }

        debug!("condition {:?} on {} = {}", self.scope.domain(), var, state);

        let scope = self.scope.without(position);
        let mut values = Vec::with_capacity(scope.table_len()?);
        for block in 0..outer {
            let start = block * stride * cardinality + state * stride;
            values.extend((0..stride).map(|low| self.table[start + low]));
        }

        let evidence: f64 = values.iter().sum();
        trace!("p({} = {}) = {}", var, state, evidence);

        Ok((Factor { scope, table: Table::from_vec(values) }, evidence))
    }


    /// Condition on every `(variable, state)` pair, in order. The variables must be strictly
    /// increasing.
    ///
    /// # Errors
    /// * `FactorError::InvalidDomain` if the evidence variables are not strictly increasing
    /// * any error of `condition`
    pub fn condition_all(&self, evidence: &[(VariableId, usize)]) -> Result<Self> {
        let vars: Vec<VariableId> = evidence.iter().map(|&(v, _)| v).collect();
        if !is_sorted(&vars) {
            return Err(FactorError::InvalidDomain(format!(
                "evidence variables {:?} are not strictly increasing",
                vars
            )));
        }

        evidence.iter().fold(Ok(self.clone()), |acc, &(v, s)| acc.and_then(|f| f.condition(v, s)))
    }


    /// Normalize every distribution over the child variable, so that for each assignment to the
    /// parents the child's entries sum to 1.
    ///
    /// A block with zero mass (no data for that parent assignment) is left as all zeros.
    ///
    /// # Returns
    /// the number of blocks left untouched because their mass was zero
    pub fn normalize_conditional(&mut self) -> usize {
        if self.scope.is_empty() {
            return 0;
        }

        let block = self.scope.cardinality()[CHILD_POSITION];
        let mut degenerate = 0;
        for mut chunk in self.table.axis_chunks_iter_mut(nd::Axis(0), block) {
            let mass = chunk.scalar_sum();
            if mass > 0.0 {
                chunk.mapv_inplace(|v| v / mass);
            } else {
                degenerate += 1;
            }
        }

        if degenerate > 0 {
            warn!(
                "{} of {} blocks of {:?} have zero mass and were left unnormalized",
                degenerate,
                self.table.len() / block,
                self.scope.domain()
            );
        }

        degenerate
    }


    /// Normalize the whole table to sum to 1. Tables whose mass is below
    /// `NORMALIZATION_EPSILON`, and scalar factors, are left untouched.
    ///
    /// # Returns
    /// the mass of the table before normalization
    pub fn normalize_full(&mut self) -> f64 {
        let mass = self.table.scalar_sum();
        if self.scope.is_empty() {
            return mass;
        }

        if mass < NORMALIZATION_EPSILON {
            warn!("mass of {:?} is {}, skipping normalization", self.scope.domain(), mass);
            return mass;
        }

        self.table.mapv_inplace(|v| v / mass);
        mass
    }


    /// Draw the state of the child variable given the states of its parents.
    ///
    /// `assignment` holds one state per variable of the domain. The parent states are read,
    /// the child's state is drawn from the (possibly unnormalized) block of the table they
    /// select and written to `assignment[CHILD_POSITION]`.
    ///
    /// # Errors
    /// * `FactorError::EmptyDomain` for a scalar `Factor`
    /// * `FactorError::DomainMismatch` or `FactorError::InvalidState` for a bad assignment
    /// * `FactorError::DivideByZero` if the selected block has no mass
    pub fn sample<R: Rng>(&self, assignment: &mut [usize], rng: &mut R) -> Result<usize> {
        if self.scope.is_empty() {
            return Err(FactorError::EmptyDomain);
        }

        self.scope.check_states(assignment, CHILD_POSITION + 1)?;

        let strides = self.scope.strides();
        let base: usize = (CHILD_POSITION + 1..strides.len())
            .map(|i| assignment[i] * strides[i])
            .sum();
        let block = self.scope.cardinality()[CHILD_POSITION];
        let probs: Vec<f64> = (0..block).map(|k| self.table[base + k]).collect();

        let mass: f64 = probs.iter().sum();
        if !(mass > 0.0) {
            return Err(FactorError::DivideByZero);
        }

        let draw = Range::new(0.0, mass).ind_sample(rng);

        // guard against round-off pushing the draw past the last cumulative bound
        let mut state = probs.iter().rposition(|&p| p > 0.0).unwrap_or(0);
        let mut upper = 0.0;
        for (k, p) in probs.iter().enumerate() {
            upper += p;
            if draw < upper {
                state = k;
                break;
            }
        }

        trace!("sampled {:?} = {} from block at {}", self.child(), state, FlatIndex::new(base));

        assignment[CHILD_POSITION] = state;
        Ok(state)
    }


    /// Fit the table by counting co-occurrences in fully observed data, then normalize it as a
    /// conditional distribution.
    ///
    /// Implementation of the MLE Parameter Estimation scheme for conditional probability
    /// distributions described in Koller & Friedman Section 17.2
    ///
    /// # Args
    /// * `dataset_domain`: the variable of each column of the data, in any order. Must contain
    ///   every variable of this `Factor`.
    /// * `rows`: fully observed rows, one state per column
    ///
    /// # Errors
    /// * `FactorError::VariableNotFound` if a variable of the `Factor` has no column
    /// * `FactorError::DomainMismatch` if a row has the wrong length
    /// * `FactorError::InvalidState` if a row holds an out of range state
    ///
    /// On error the table is left as it was.
    pub fn maximum_likelihood_estimate<I, R>(&mut self, dataset_domain: &[VariableId], rows: I) -> Result<()>
        where I: IntoIterator<Item = R>,
              R: AsRef<[usize]>
    {
        if self.scope.is_empty() {
            return Ok(());
        }

        let columns = self.scope
            .domain()
            .iter()
            .map(|&v| dataset_domain.iter().position(|&d| d == v).ok_or(FactorError::VariableNotFound(v)))
            .collect::<Result<Vec<usize>>>()?;

        let strides = self.scope.strides();
        let mut counts = Table::zeros(self.table.len());
        let mut projected = vec![0; columns.len()];
        let mut observed = 0;

        for row in rows {
            let row = row.as_ref();
            if row.len() != dataset_domain.len() {
                return Err(FactorError::DomainMismatch(format!(
                    "row has {} states but the dataset has {} columns",
                    row.len(),
                    dataset_domain.len()
                )));
            }

            for (p, &c) in projected.iter_mut().zip(&columns) {
                *p = row[c];
            }

            self.scope.check_states(&projected, 0)?;
            counts[strides.index_of(&projected)?.get()] += 1.0;
            observed += 1;
        }

        debug!("fit {:?} from {} rows", self.scope.domain(), observed);

        self.table = counts;
        self.normalize_conditional();

        Ok(())
    }

}

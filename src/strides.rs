//! Mixed-radix addressing of flat factor tables.
//!
//! A table over a domain with cardinalities `c` is stored as a flat array where the first
//! variable of the domain varies fastest:
//!
//! ```text
//! stride[0] = 1
//! stride[i] = stride[i - 1] * c[i - 1]
//! index(a)  = sum(a[i] * stride[i])
//! ```

use crate::util::{FactorError, Result};

use std::fmt;
use std::ops::Index;

/// An offset into a flat factor table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlatIndex(usize);

impl FlatIndex {

    pub fn new(index: usize) -> Self {
        FlatIndex(index)
    }

    pub fn get(self) -> usize {
        self.0
    }

}

impl fmt::Display for FlatIndex {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }

}


/// The per-variable strides of a table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strides(Vec<usize>);

impl Strides {

    /// Compute the strides for a cardinality vector
    pub fn new(cardinality: &[usize]) -> Self {
        let mut strides = Vec::with_capacity(cardinality.len());
        let mut stride = 1;
        for &c in cardinality {
            strides.push(stride);
            stride *= c;
        }

        Strides(strides)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }


    /// Map an assignment (one state per variable, in domain order) to its flat offset.
    ///
    /// States are not range checked here, see `Scope::flat_index`.
    ///
    /// # Errors
    /// * `FactorError::DomainMismatch` if the assignment and the strides differ in length
    pub fn index_of(&self, assignment: &[usize]) -> Result<FlatIndex> {
        if assignment.len() != self.0.len() {
            return Err(FactorError::DomainMismatch(format!(
                "assignment has {} states but there are {} strides",
                assignment.len(),
                self.0.len()
            )));
        }

        Ok(FlatIndex(self.0.iter().zip(assignment).map(|(s, a)| s * a).sum()))
    }

}

impl Index<usize> for Strides {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}


/// Outcome of advancing an `Odometer`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The digit at this position was incremented and every lower digit was reset to zero
    Advanced(usize),

    /// Every digit wrapped back to zero
    Overflow
}


/// A mixed-radix counter whose lowest digit comes first. Counting from all zeros until
/// `Tick::Overflow` visits every assignment of a domain in flat table order.
#[derive(Clone, Debug)]
pub struct Odometer {
    radices: Vec<usize>,
    digits: Vec<usize>
}

impl Odometer {

    pub fn new(radices: &[usize]) -> Self {
        Odometer {
            radices: radices.to_vec(),
            digits: vec![0; radices.len()]
        }
    }

    pub fn digits(&self) -> &[usize] {
        &self.digits
    }

    pub fn increment(&mut self) -> Tick {
        for (d, (digit, &radix)) in self.digits.iter_mut().zip(&self.radices).enumerate() {
            *digit += 1;
            if *digit < radix {
                return Tick::Advanced(d);
            }
            *digit = 0;
        }

        Tick::Overflow
    }

}


/// Tracks an offset into some table while an `Odometer` walks a (possibly different) domain.
///
/// Each digit of the odometer moves the offset by its own stride. A stride of zero means the
/// digit does not affect the offset, which is how a table is broadcast over extra variables.
#[derive(Clone, Debug)]
pub struct Cursor {
    strides: Vec<usize>,

    /// `rollback[d]` is the offset contributed by every digit below `d` at its maximum state,
    /// which is what is undone when those digits wrap to zero
    rollback: Vec<usize>,

    position: usize
}

impl Cursor {

    pub fn new(strides: Vec<usize>, radices: &[usize]) -> Self {
        let mut rollback = Vec::with_capacity(strides.len());
        let mut acc = 0;
        for (s, r) in strides.iter().zip(radices) {
            rollback.push(acc);
            acc += s * (r - 1);
        }

        Cursor { strides, rollback, position: 0 }
    }

    pub fn position(&self) -> FlatIndex {
        FlatIndex(self.position)
    }

    /// Follow an odometer that has just advanced the given digit
    pub fn advance(&mut self, digit: usize) {
        self.position = self.position - self.rollback[digit] + self.strides[digit];
    }

}

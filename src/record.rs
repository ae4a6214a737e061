//! Serialized form of a `Factor`: the flat `(domain, cardinality, table)` tuple.
//!
//! Deserializing goes through `Factor::new`, so a record that breaks any of the invariants of a
//! `Factor` is rejected instead of producing a corrupted one.

use crate::factor::Factor;
use crate::scope::VariableId;
use crate::util::FactorError;

use serde::{Deserialize, Serialize};

use std::convert::TryFrom;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorRecord {
    pub domain: Vec<VariableId>,
    pub cardinality: Vec<usize>,
    pub table: Vec<f64>
}

impl From<Factor> for FactorRecord {

    fn from(factor: Factor) -> Self {
        FactorRecord {
            domain: factor.domain().to_vec(),
            cardinality: factor.cardinality().to_vec(),
            table: factor.table().to_vec()
        }
    }

}

impl TryFrom<FactorRecord> for Factor {
    type Error = FactorError;

    fn try_from(record: FactorRecord) -> Result<Self, Self::Error> {
        Factor::new(record.domain, record.cardinality, record.table)
    }
}

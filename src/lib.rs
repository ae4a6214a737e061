extern crate indexmap;
extern crate itertools;
extern crate ndarray;
extern crate ndarray_rand;
extern crate rand;

pub mod scope;
pub mod strides;
pub mod factor;
pub mod record;
pub mod init;
pub mod estimators;
pub mod model;
pub mod util;
pub use crate::util::{Result, FactorError};
pub use crate::scope::{Scope, VariableId};
pub use crate::factor::{Factor, Table, CHILD_POSITION};

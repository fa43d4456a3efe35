//! Error taxonomy for comparison sets and hierarchies.

use thiserror::Error;

/// Errors raised while building comparisons or wiring hierarchies.
///
/// Every error is detected eagerly: a comparison is either fully constructed
/// or not constructed at all, and a failed `add_children` leaves the
/// hierarchy untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AhpError {
    #[error("comparison {name} has no judgments")]
    NoJudgments { name: String },

    #[error("{key}: {value} is an invalid judgment ({reason})")]
    InvalidJudgment {
        key: String,
        value: f64,
        reason: &'static str,
    },

    #[error(
        "matrix of size {size} x {size} is too large for the {random_index} random index \
         (max {max}); disable the consistency ratio to compute weights anyway"
    )]
    MatrixTooLarge {
        size: usize,
        max: usize,
        random_index: String,
    },

    #[error("child {child} does not match any element of parent {parent}")]
    HierarchyMismatch { parent: String, child: String },

    #[error("attaching {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: String, child: String },

    #[error("numerical failure in {name}: {detail}")]
    NumericalFailure { name: String, detail: String },

    #[error("unknown node: {name}")]
    UnknownNode { name: String },

    #[error("duplicate node: {name}")]
    DuplicateNode { name: String },

    #[error("invalid configuration {field}: {value}")]
    InvalidConfig { field: &'static str, value: f64 },
}

impl AhpError {
    pub(crate) fn numerical(name: &str, detail: impl Into<String>) -> Self {
        AhpError::NumericalFailure {
            name: name.to_string(),
            detail: detail.into(),
        }
    }
}

//! Per-comparison configuration.
//!
//! Every comparison carries its own config; there are no process-wide defaults
//! beyond `CompareConfig::default()`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AhpError;

/// Random-index estimates used to turn a consistency index into a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomIndex {
    /// Donegan & Dodd, 'A Note on Saaty's Random Indexes' (1991). Sizes 3..=100.
    #[default]
    #[serde(alias = "DD", alias = "Dd")]
    Dd,
    /// Saaty, 'Theory and Applications of the Analytic Network Process' (2005). Sizes 3..=15.
    #[serde(alias = "Saaty", alias = "SAATY")]
    Saaty,
}

impl RandomIndex {
    /// Largest matrix dimension covered by the table.
    pub fn max_size(self) -> usize {
        match self {
            RandomIndex::Dd => 100,
            RandomIndex::Saaty => 15,
        }
    }

    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            RandomIndex::Dd => "Donegan & Dodd",
            RandomIndex::Saaty => "Saaty",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RandomIndex::Dd => "dd",
            RandomIndex::Saaty => "saaty",
        }
    }
}

impl fmt::Display for RandomIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RandomIndex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dd" => Ok(RandomIndex::Dd),
            "saaty" => Ok(RandomIndex::Saaty),
            other => Err(format!("unknown random index '{other}' (expected 'dd' or 'saaty')")),
        }
    }
}

/// Configuration for building one comparison set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Decimal places used for the priority vector and the consistency ratio.
    pub precision: u32,
    /// Random-index table for the consistency ratio.
    pub random_index: RandomIndex,
    /// Maximum number of matrix squarings in the priority vector estimator.
    pub iterations: usize,
    /// Stopping threshold for the completion sweeps (Euclidean norm of the change).
    pub tolerance: f64,
    /// Whether to compute the consistency ratio. Disabling it also lifts the size bound.
    pub consistency: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            random_index: RandomIndex::Dd,
            iterations: 100,
            tolerance: 1e-4,
            consistency: true,
        }
    }
}

impl CompareConfig {
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_random_index(mut self, random_index: RandomIndex) -> Self {
        self.random_index = random_index;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_consistency(mut self, consistency: bool) -> Self {
        self.consistency = consistency;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), AhpError> {
        if self.iterations == 0 {
            return Err(AhpError::InvalidConfig {
                field: "iterations",
                value: 0.0,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(AhpError::InvalidConfig {
                field: "tolerance",
                value: self.tolerance,
            });
        }
        // Beyond this 10^precision overflows to infinity.
        if self.precision > 300 {
            return Err(AhpError::InvalidConfig {
                field: "precision",
                value: self.precision as f64,
            });
        }
        Ok(())
    }
}

/// Round half-to-even at `precision` decimal places.
///
/// Scales, rounds to the nearest integer and scales back, so values such as
/// `0.06665` (stored as `0.066649999...`) round down at four places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round_ties_even() / scale
}

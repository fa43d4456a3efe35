//! One comparison set, fully computed at construction.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::{complete_matrix, MissingComparisons};
use crate::config::{CompareConfig, RandomIndex};
use crate::consistency::consistency_ratio;
use crate::error::AhpError;
use crate::judgments::Judgments;
use crate::matrix::{build_matrix, ComparisonMatrix};
use crate::priority::{normalized_weights, principal_eigenvector};
use crate::weights::WeightMap;

/// A named comparison set with its local weights and consistency ratio.
///
/// Judgments and matrix are immutable after construction. Placement in a
/// hierarchy (global and target weights) is tracked by [`crate::Hierarchy`].
#[derive(Debug, Clone)]
pub struct Comparison {
    name: String,
    config: CompareConfig,
    judgments: Judgments,
    matrix: ComparisonMatrix,
    local_weights: WeightMap,
    consistency_ratio: Option<f64>,
    missing: MissingComparisons,
}

impl Comparison {
    /// Validate, build, complete and score a comparison set.
    ///
    /// Ratio judgments get a reciprocal matrix (completed if pairs are missing)
    /// and an eigenvector priority; measured judgments are normalized and have
    /// a consistency ratio of `0.0`. In ratio mode the consistency ratio is
    /// `None` when `config.consistency` is off.
    pub fn new(
        name: impl Into<String>,
        judgments: Judgments,
        config: CompareConfig,
    ) -> Result<Self, AhpError> {
        let name = name.into();
        config.validate()?;
        let judgments = judgments.deduplicated();
        judgments.validate()?;

        let mut matrix = build_matrix(&name, &judgments, &config)?;

        let (vector, consistency, missing) = match &mut matrix {
            ComparisonMatrix::Ratio(m) => {
                let completion = complete_matrix(&name, m, config.tolerance)?;
                let estimate = principal_eigenvector(&m.values, config.precision, config.iterations)
                    .ok_or_else(|| AhpError::numerical(&name, "matrix powers are not finite"))?;
                let consistency = if config.consistency {
                    let cr = consistency_ratio(&m.values, config.random_index, config.precision)
                        .ok_or_else(|| {
                            AhpError::numerical(&name, "dominant eigenvalue is undefined")
                        })?;
                    Some(cr)
                } else {
                    None
                };
                debug!(
                    name = %name,
                    size = m.size(),
                    missing = completion.missing.len(),
                    sweeps = completion.sweeps,
                    squarings = estimate.squarings,
                    "ratio comparison computed"
                );
                (estimate.vector, consistency, completion.missing)
            }
            ComparisonMatrix::Measured(v) => (
                normalized_weights(&v.values, config.precision),
                Some(0.0),
                MissingComparisons::default(),
            ),
        };

        let local_weights = WeightMap::sorted_descending(
            matrix
                .elements()
                .iter()
                .cloned()
                .zip(vector)
                .collect(),
        );

        Ok(Self {
            name,
            config,
            judgments,
            matrix,
            local_weights,
            consistency_ratio: consistency,
            missing,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn precision(&self) -> u32 {
        self.config.precision
    }

    /// Random index used for the consistency ratio, if one was computed.
    pub fn random_index(&self) -> Option<RandomIndex> {
        self.config.consistency.then_some(self.config.random_index)
    }

    /// Deduplicated input judgments.
    pub fn judgments(&self) -> &Judgments {
        &self.judgments
    }

    pub fn matrix(&self) -> &ComparisonMatrix {
        &self.matrix
    }

    /// Elements in first-seen order.
    pub fn elements(&self) -> &[String] {
        self.matrix.elements()
    }

    /// Local priority vector, sorted by descending weight.
    pub fn local_weights(&self) -> &WeightMap {
        &self.local_weights
    }

    pub fn consistency_ratio(&self) -> Option<f64> {
        self.consistency_ratio
    }

    /// Completed values of the comparisons absent from the input.
    pub fn missing_comparisons(&self) -> &MissingComparisons {
        &self.missing
    }
}

/// JSON-friendly constructor arguments for one comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub name: String,
    pub judgments: Judgments,
    #[serde(default)]
    pub config: CompareConfig,
}

impl CompareRequest {
    pub fn build(self) -> Result<Comparison, AhpError> {
        Comparison::new(self.name, self.judgments, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_comparison_sorts_weights_descending() {
        let c = Comparison::new(
            "t",
            Judgments::ratio([("a", "b", 0.5), ("a", "c", 2.0), ("b", "c", 4.0)]),
            CompareConfig::default(),
        )
        .unwrap();
        let keys: Vec<&str> = c.local_weights().keys().collect();
        assert_eq!(keys[0], "b");
        assert_eq!(c.elements(), &["a", "b", "c"]);
        assert!((c.local_weights().total() - 1.0).abs() < 1e-3);
        assert!(c.consistency_ratio().unwrap() >= 0.0);
        assert!(c.missing_comparisons().is_empty());
    }

    #[test]
    fn measured_comparison_has_zero_consistency_ratio() {
        let c = Comparison::new(
            "t",
            Judgments::measured([("x", 1.0), ("y", 2.0), ("z", 3.0)]),
            CompareConfig::default().with_consistency(false),
        )
        .unwrap();
        assert_eq!(c.consistency_ratio(), Some(0.0));
        assert_eq!(c.random_index(), None);
        let keys: Vec<&str> = c.local_weights().keys().collect();
        assert_eq!(keys, vec!["z", "y", "x"]);
    }

    #[test]
    fn disabled_consistency_leaves_ratio_absent() {
        let c = Comparison::new(
            "t",
            Judgments::ratio([("a", "b", 3.0), ("b", "c", 3.0), ("a", "c", 9.0)]),
            CompareConfig::default().with_consistency(false),
        )
        .unwrap();
        assert_eq!(c.consistency_ratio(), None);
    }

    #[test]
    fn two_element_matrix_is_consistent() {
        let c = Comparison::new(
            "t",
            Judgments::ratio([("d", "e", 4.0)]),
            CompareConfig::default(),
        )
        .unwrap();
        assert_eq!(c.consistency_ratio(), Some(0.0));
        assert_eq!(c.local_weights().get("d"), Some(0.8));
        assert_eq!(c.local_weights().get("e"), Some(0.2));
    }

    #[test]
    fn invalid_judgment_aborts_construction() {
        let err = Comparison::new(
            "t",
            Judgments::ratio([("a", "b", 2.0), ("b", "c", -1.0)]),
            CompareConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AhpError::InvalidJudgment { .. }));
    }

    #[test]
    fn request_deserializes_with_default_config() {
        let raw = r#"{"name": "fuel", "judgments": {"measured": [["civic", 34], ["clio", 28]]}}"#;
        let req: CompareRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.config, CompareConfig::default());
        let c = req.build().unwrap();
        assert_eq!(c.name(), "fuel");
        assert_eq!(c.local_weights().len(), 2);
    }
}

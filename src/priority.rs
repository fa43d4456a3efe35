//! Priority vector estimation.
//!
//! Ratio matrices use repeated squaring: the normalized row sums of `A^(2^k)`
//! converge to the principal eigenvector, and the loop stops once two
//! consecutive candidates agree at the requested precision. Measured inputs
//! are simply normalized.

use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::config::round_to;

/// Result of the squaring estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityEstimate {
    /// Rounded weights, in matrix (element) order.
    pub vector: Vec<f64>,
    /// Number of squarings performed.
    pub squarings: usize,
    /// Whether two consecutive candidates agreed before the budget ran out.
    pub converged: bool,
}

/// Principal eigenvector of a complete positive matrix.
///
/// Each step squares the previous (already squared) matrix, so the effective
/// power doubles. The comparison starts from a zero vector. At most
/// `iterations` squarings are performed; the last candidate is returned if
/// they never agree. Returns `None` if the matrix powers stop being finite.
pub fn principal_eigenvector(
    values: &DMatrix<f64>,
    precision: u32,
    iterations: usize,
) -> Option<PriorityEstimate> {
    let n = values.nrows();
    let mut matrix = values.clone();
    let mut previous = vec![0.0; n];
    let budget = iterations.max(1);

    for step in 1..=budget {
        let squared = &matrix * &matrix;
        let row_sums: Vec<f64> = squared.row_iter().map(|row| row.sum()).collect();
        let total: f64 = squared.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        let candidate: Vec<f64> = row_sums.iter().map(|s| s / total).collect();

        let settled = candidate
            .iter()
            .zip(&previous)
            .all(|(c, p)| round_to(c - p, precision) == 0.0);
        if settled {
            debug!(squarings = step, "priority vector converged");
            return Some(PriorityEstimate {
                vector: candidate.iter().map(|v| round_to(*v, precision)).collect(),
                squarings: step,
                converged: true,
            });
        }
        if step == budget {
            warn!(
                squarings = step,
                "priority vector did not converge; returning last candidate"
            );
            return Some(PriorityEstimate {
                vector: candidate.iter().map(|v| round_to(*v, precision)).collect(),
                squarings: step,
                converged: false,
            });
        }
        matrix = squared;
        previous = candidate;
    }
    None
}

/// Weights for measured magnitudes: each value over the total, rounded.
pub fn normalized_weights(values: &[f64], precision: u32) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values.iter().map(|v| round_to(v / total, precision)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_matrix_recovers_ratio_scale() {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 4.0, 0.5, 1.0, 2.0, 0.25, 0.5, 1.0]);
        let est = principal_eigenvector(&m, 4, 100).unwrap();
        assert!(est.converged);
        assert_eq!(est.vector, vec![0.5714, 0.2857, 0.1429]);
        // First squaring is already exact; the second confirms it.
        assert_eq!(est.squarings, 2);
    }

    #[test]
    fn budget_of_one_returns_first_candidate() {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 1.0, 0.5, 1.0, 2.0, 1.0, 0.5, 1.0]);
        let est = principal_eigenvector(&m, 4, 1).unwrap();
        assert!(!est.converged);
        assert_eq!(est.squarings, 1);
        assert!((est.vector.iter().sum::<f64>() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn uniform_matrix_gives_uniform_weights() {
        let m = DMatrix::from_element(26, 26, 1.0);
        let est = principal_eigenvector(&m, 4, 100).unwrap();
        assert!(est.vector.iter().all(|w| *w == 0.0385));
    }

    #[test]
    fn overflowing_powers_are_reported() {
        let big = DMatrix::from_element(2, 2, f64::MAX);
        assert!(principal_eigenvector(&big, 4, 10).is_none());
    }

    #[test]
    fn normalized_weights_divide_by_total() {
        let w = normalized_weights(&[34.0, 27.0, 24.0, 28.0], 4);
        assert_eq!(w, vec![0.3009, 0.2389, 0.2124, 0.2478]);
    }
}

//! Consistency scoring: Perron root, random-index tables, consistency ratio.

use nalgebra::linalg::Schur;
use nalgebra::DMatrix;

use crate::config::{round_to, RandomIndex};

/// Iteration cap for the real Schur decomposition.
const SCHUR_MAX_ITERATIONS: usize = 10_000;

/// Saaty (2005), p. 31.
const SAATY_RANDOM_INDEX: &[(usize, f64)] = &[
    (3, 0.52),
    (4, 0.89),
    (5, 1.11),
    (6, 1.25),
    (7, 1.35),
    (8, 1.40),
    (9, 1.45),
    (10, 1.49),
    (11, 1.52),
    (12, 1.54),
    (13, 1.56),
    (14, 1.58),
    (15, 1.59),
];

/// Donegan & Dodd (1991). Sparse above 20; intermediate sizes are interpolated.
const DD_RANDOM_INDEX: &[(usize, f64)] = &[
    (3, 0.4914),
    (4, 0.8286),
    (5, 1.0591),
    (6, 1.1797),
    (7, 1.2519),
    (8, 1.3171),
    (9, 1.3733),
    (10, 1.4055),
    (11, 1.4213),
    (12, 1.4497),
    (13, 1.4643),
    (14, 1.4822),
    (15, 1.4969),
    (16, 1.5078),
    (17, 1.5153),
    (18, 1.5262),
    (19, 1.5313),
    (20, 1.5371),
    (25, 1.5619),
    (30, 1.5772),
    (40, 1.5976),
    (50, 1.6102),
    (60, 1.6178),
    (70, 1.6237),
    (80, 1.6277),
    (90, 1.6213),
    (100, 1.6339),
];

fn table(scheme: RandomIndex) -> &'static [(usize, f64)] {
    match scheme {
        RandomIndex::Dd => DD_RANDOM_INDEX,
        RandomIndex::Saaty => SAATY_RANDOM_INDEX,
    }
}

/// RI(n) for `3 <= n <= scheme.max_size()`, linearly interpolated between
/// the nearest tabulated sizes. `None` outside the table.
pub fn random_index_value(scheme: RandomIndex, n: usize) -> Option<f64> {
    let t = table(scheme);
    let sizes_pos = t.partition_point(|(size, _)| *size < n);
    let &(at_size, at_value) = t.get(sizes_pos)?;
    if at_size == n {
        return Some(at_value);
    }
    if sizes_pos == 0 {
        return None;
    }
    let (smaller, ri_smaller) = t[sizes_pos - 1];
    let (larger, ri_larger) = (at_size, at_value);
    let slope = (ri_larger - ri_smaller) / (larger - smaller) as f64;
    Some(slope * (n - smaller) as f64 + ri_smaller)
}

/// Largest real part among the eigenvalues of `values`.
///
/// For a positive matrix this is the Perron-Frobenius eigenvalue. Returns
/// `None` if the decomposition does not converge or the result is not finite.
pub fn dominant_eigenvalue(values: &DMatrix<f64>) -> Option<f64> {
    if values.nrows() == 0 || values.nrows() != values.ncols() {
        return None;
    }
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let schur = Schur::try_new(values.clone(), f64::EPSILON, SCHUR_MAX_ITERATIONS)?;
    let lambda = schur
        .complex_eigenvalues()
        .iter()
        .map(|c| c.re)
        .fold(f64::NEG_INFINITY, f64::max);
    lambda.is_finite().then_some(lambda)
}

/// Consistency ratio CR = CI / RI(n) with CI = (lambda_max - n) / (n - 1).
///
/// Matrices smaller than 3 x 3 are always consistent. The rounded value is
/// made non-negative so an exactly consistent matrix never reports `-0.0`.
/// Returns `None` when the eigenvalue cannot be computed or `n` is outside
/// the random-index table.
pub fn consistency_ratio(values: &DMatrix<f64>, scheme: RandomIndex, precision: u32) -> Option<f64> {
    let n = values.nrows();
    if n < 3 {
        return Some(0.0);
    }
    let ri = random_index_value(scheme, n)?;
    let lambda_max = dominant_eigenvalue(values)?;
    let ci = (lambda_max - n as f64) / (n - 1) as f64;
    Some(round_to(ci / ri, precision).abs())
}

//! Optimal completion of incomplete pairwise comparison matrices.
//!
//! Cyclic coordinate descent from Bozóki, Fülöp and Rónyai, 'On optimal
//! completion of incomplete pairwise comparison matrices', Mathematical and
//! Computer Modelling 52 (2010) 318-333: each missing cell is in turn set to the
//! value minimizing the Perron root of the whole matrix, with every other cell
//! held fixed. A full pass over the missing cells is one sweep; sweeps repeat
//! until the missing values stop moving.

use tracing::{debug, trace};

use crate::consistency::dominant_eigenvalue;
use crate::error::AhpError;
use crate::judgments::Pair;
use crate::matrix::RatioMatrix;

/// Absolute x tolerance of the bounded scalar search.
const SEARCH_XATOL: f64 = 1e-5;
/// Evaluation cap of the bounded scalar search.
const SEARCH_MAX_EVALUATIONS: usize = 500;
/// Multiplier on the largest defined matrix entry for the search upper bound.
const UPPER_BOUND_FACTOR: f64 = 10.0;

/// Estimated values of the originally missing comparisons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingComparisons {
    entries: Vec<(Pair, f64)>,
}

impl MissingComparisons {
    pub fn iter(&self) -> impl Iterator<Item = (&Pair, f64)> + '_ {
        self.entries.iter().map(|(p, v)| (p, *v))
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(p, _)| p.0 == a && p.1 == b)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries keyed as `"a, b"` for reporting.
    pub fn keyed_entries(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|(p, v)| (p.to_string(), *v))
            .collect()
    }
}

/// Summary of one completion run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub missing: MissingComparisons,
    pub sweeps: usize,
    pub last_delta: f64,
}

/// Fill every missing cell of `matrix` in place.
///
/// A matrix without missing cells is left untouched. There is no sweep cap:
/// the loop runs until the Euclidean norm of the change between two sweeps is
/// at most `tolerance`.
pub fn complete_matrix(
    name: &str,
    matrix: &mut RatioMatrix,
    tolerance: f64,
) -> Result<CompletionOutcome, AhpError> {
    if matrix.missing.is_empty() {
        return Ok(CompletionOutcome {
            missing: MissingComparisons::default(),
            sweeps: 0,
            last_delta: 0.0,
        });
    }

    let cells = matrix.missing.clone();
    let mut current = vec![1.0; cells.len()];
    let mut last = current.clone();
    let mut delta = f64::INFINITY;
    let mut sweeps = 0;

    while delta > tolerance {
        let upper_bound = largest_defined_entry(matrix) * UPPER_BOUND_FACTOR;
        if !upper_bound.is_finite() || upper_bound <= 0.0 {
            return Err(AhpError::numerical(name, "invalid completion search bound"));
        }

        for (k, &(i, j)) in cells.iter().enumerate() {
            for (other, &(oi, oj)) in cells.iter().enumerate() {
                if other != k {
                    matrix.set_reciprocal(oi, oj, current[other]);
                }
            }
            let best = minimize_bounded(
                |x| {
                    matrix.set_reciprocal(i, j, x);
                    dominant_eigenvalue(&matrix.values)
                },
                0.0,
                upper_bound,
                SEARCH_XATOL,
                SEARCH_MAX_EVALUATIONS,
            )
            .ok_or_else(|| {
                AhpError::numerical(name, "eigenvalue computation failed during matrix completion")
            })?;
            trace!(
                name,
                row = i,
                col = j,
                x = best.x,
                lambda_max = best.fx,
                evaluations = best.evaluations,
                "missing comparison optimized"
            );
            current[k] = best.x;
            matrix.set_reciprocal(i, j, best.x);
        }

        sweeps += 1;
        delta = current
            .iter()
            .zip(&last)
            .map(|(c, l)| (c - l) * (c - l))
            .sum::<f64>()
            .sqrt();
        debug!(name, sweeps, upper_bound, delta, "completion sweep");
        last.clone_from(&current);
    }

    let missing = MissingComparisons {
        entries: matrix
            .missing_pairs()
            .into_iter()
            .zip(current.iter().copied())
            .collect(),
    };
    Ok(CompletionOutcome {
        missing,
        sweeps,
        last_delta: delta,
    })
}

/// Largest entry of the matrix, ignoring cells that are still undefined.
fn largest_defined_entry(matrix: &RatioMatrix) -> f64 {
    matrix
        .values
        .iter()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b))
}

/// Result of the bounded scalar search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundedMinimum {
    pub x: f64,
    pub fx: f64,
    pub evaluations: usize,
}

/// Brent's bounded minimization of a scalar function on `[lower, upper]`.
///
/// Golden-section steps with parabolic interpolation, terminating when the
/// bracket shrinks below `xatol / 3 + sqrt(eps) * |x|`. Returns `None` if the
/// objective fails or yields a non-finite value at the minimum.
pub(crate) fn minimize_bounded<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    xatol: f64,
    max_evaluations: usize,
) -> Option<BoundedMinimum>
where
    F: FnMut(f64) -> Option<f64>,
{
    let sqrt_eps = 2.2e-16_f64.sqrt();
    let golden_mean = 0.5 * (3.0 - 5.0_f64.sqrt());

    let (mut a, mut b) = (lower, upper);
    let mut fulc = a + golden_mean * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat: f64 = 0.0;
    let mut e: f64 = 0.0;
    let mut fx = f(xf)?;
    let mut evaluations = 1;
    let mut ffulc = fx;
    let mut fnfc = fx;
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = golden_mean * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x)?;
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
        tol2 = 2.0 * tol1;

        if evaluations >= max_evaluations {
            break;
        }
    }

    if xf.is_nan() || !fx.is_finite() {
        return None;
    }
    Some(BoundedMinimum {
        x: xf,
        fx,
        evaluations,
    })
}

/// `sign(v)`, with zero mapped to `+1`.
fn sign_or_one(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

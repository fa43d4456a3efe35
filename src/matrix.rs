//! Matrix builder: judgments -> reciprocal comparison matrix (or measured vector).

use nalgebra::DMatrix;

use crate::config::CompareConfig;
use crate::error::AhpError;
use crate::judgments::{Judgments, MeasuredJudgment, Pair, RatioJudgment};

/// Positive reciprocal matrix built from pairwise judgments.
///
/// Cells without a supplied judgment hold `NaN` until the completion engine
/// fills them. `missing` lists those cells once per relationship, as upper
/// triangle coordinates `(i, j)` with `i < j`, in row-major order.
#[derive(Debug, Clone)]
pub struct RatioMatrix {
    pub(crate) elements: Vec<String>,
    pub(crate) values: DMatrix<f64>,
    pub(crate) missing: Vec<(usize, usize)>,
}

impl RatioMatrix {
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.values.iter().any(|v| v.is_nan())
    }

    /// Pairs that had no supplied judgment.
    pub fn missing_pairs(&self) -> Vec<Pair> {
        self.missing
            .iter()
            .map(|&(i, j)| Pair::new(self.elements[i].clone(), self.elements[j].clone()))
            .collect()
    }

    /// Write `value` at `(i, j)` and its reciprocal at `(j, i)`.
    pub(crate) fn set_reciprocal(&mut self, i: usize, j: usize, value: f64) {
        self.values[(i, j)] = value;
        self.values[(j, i)] = 1.0 / value;
    }
}

/// Raw magnitudes for measured ("normalize") inputs.
#[derive(Debug, Clone)]
pub struct MeasuredVector {
    pub(crate) elements: Vec<String>,
    pub(crate) values: Vec<f64>,
}

impl MeasuredVector {
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Built form of a comparison set, selected once from the judgment shape.
#[derive(Debug, Clone)]
pub enum ComparisonMatrix {
    Ratio(RatioMatrix),
    Measured(MeasuredVector),
}

impl ComparisonMatrix {
    pub fn elements(&self) -> &[String] {
        match self {
            ComparisonMatrix::Ratio(m) => m.elements(),
            ComparisonMatrix::Measured(v) => v.elements(),
        }
    }

    pub fn size(&self) -> usize {
        self.elements().len()
    }
}

/// Build the matrix for a validated, deduplicated judgment set.
///
/// Ratio mode: elements in first-seen order, `(a, b) = v` and `(b, a) = 1/v`;
/// later judgments overwrite earlier cells, so a supplied `(b, a)` wins over the
/// reciprocal of an earlier `(a, b)`.
pub fn build_matrix(
    name: &str,
    judgments: &Judgments,
    cfg: &CompareConfig,
) -> Result<ComparisonMatrix, AhpError> {
    if judgments.is_empty() {
        return Err(AhpError::NoJudgments {
            name: name.to_string(),
        });
    }
    match judgments {
        Judgments::Ratio(items) => build_ratio_matrix(items, cfg).map(ComparisonMatrix::Ratio),
        Judgments::Measured(items) => Ok(ComparisonMatrix::Measured(MeasuredVector {
            elements: items.iter().map(|MeasuredJudgment(n, _)| n.clone()).collect(),
            values: items.iter().map(|MeasuredJudgment(_, v)| *v).collect(),
        })),
    }
}

fn build_ratio_matrix(items: &[RatioJudgment], cfg: &CompareConfig) -> Result<RatioMatrix, AhpError> {
    let mut elements: Vec<String> = Vec::new();
    for RatioJudgment(a, b, _) in items {
        for e in [a, b] {
            if !elements.contains(e) {
                elements.push(e.clone());
            }
        }
    }

    let n = elements.len();
    check_size(n, cfg)?;

    let index = |e: &str| elements.iter().position(|x| x == e);
    let mut values = DMatrix::<f64>::from_element(n, n, f64::NAN);
    for d in 0..n {
        values[(d, d)] = 1.0;
    }
    for RatioJudgment(a, b, v) in items {
        // Both are present: every element was collected from these keys.
        if let (Some(i), Some(j)) = (index(a), index(b)) {
            values[(i, j)] = *v;
            values[(j, i)] = 1.0 / *v;
        }
    }

    let mut missing = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if values[(i, j)].is_nan() {
                missing.push((i, j));
            }
        }
    }

    Ok(RatioMatrix {
        elements,
        values,
        missing,
    })
}

fn check_size(n: usize, cfg: &CompareConfig) -> Result<(), AhpError> {
    let max = cfg.random_index.max_size();
    if cfg.consistency && n > max {
        return Err(AhpError::MatrixTooLarge {
            size: n,
            max,
            random_index: cfg.random_index.to_string(),
        });
    }
    Ok(())
}

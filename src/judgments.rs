//! Judgment inputs: pairwise ratios or directly measured magnitudes.
//!
//! A comparison set is homogeneous. The two shapes are separate variants of
//! [`Judgments`], so a set can never mix pair keys and single keys.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AhpError;

/// Ordered pair of element names: `(a, b)` reads "a compared with b".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair(pub String, pub String);

impl Pair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Pair(a.into(), b.into())
    }

    pub fn reversed(&self) -> Pair {
        Pair(self.1.clone(), self.0.clone())
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.0, self.1)
    }
}

/// How much more `a` is preferred over `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioJudgment(pub String, pub String, pub f64);

/// A measured magnitude for a single element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredJudgment(pub String, pub f64);

/// Input judgments for one comparison set.
///
/// JSON: `{"ratio": [["a", "b", 3.0], ...]}` or `{"measured": [["a", 1.2], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgments {
    Ratio(Vec<RatioJudgment>),
    Measured(Vec<MeasuredJudgment>),
}

impl Judgments {
    pub fn ratio<I, A, B>(items: I) -> Self
    where
        I: IntoIterator<Item = (A, B, f64)>,
        A: Into<String>,
        B: Into<String>,
    {
        Judgments::Ratio(
            items
                .into_iter()
                .map(|(a, b, v)| RatioJudgment(a.into(), b.into(), v))
                .collect(),
        )
    }

    pub fn measured<I, A>(items: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<String>,
    {
        Judgments::Measured(
            items
                .into_iter()
                .map(|(a, v)| MeasuredJudgment(a.into(), v))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Judgments::Ratio(items) => items.len(),
            Judgments::Measured(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ratio(&self) -> bool {
        matches!(self, Judgments::Ratio(_))
    }

    /// Collapse repeated keys: a key keeps its first position and its last value.
    pub fn deduplicated(&self) -> Judgments {
        match self {
            Judgments::Ratio(items) => {
                let mut position: HashMap<(&str, &str), usize> = HashMap::new();
                let mut out: Vec<RatioJudgment> = Vec::with_capacity(items.len());
                for item in items {
                    match position.get(&(item.0.as_str(), item.1.as_str())) {
                        Some(&idx) => out[idx].2 = item.2,
                        None => {
                            position.insert((item.0.as_str(), item.1.as_str()), out.len());
                            out.push(item.clone());
                        }
                    }
                }
                Judgments::Ratio(out)
            }
            Judgments::Measured(items) => {
                let mut position: HashMap<&str, usize> = HashMap::new();
                let mut out: Vec<MeasuredJudgment> = Vec::with_capacity(items.len());
                for item in items {
                    match position.get(item.0.as_str()) {
                        Some(&idx) => out[idx].1 = item.1,
                        None => {
                            position.insert(item.0.as_str(), out.len());
                            out.push(item.clone());
                        }
                    }
                }
                Judgments::Measured(out)
            }
        }
    }

    /// Reject values that are not finite and strictly positive, and self-comparisons.
    pub fn validate(&self) -> Result<(), AhpError> {
        match self {
            Judgments::Ratio(items) => {
                for RatioJudgment(a, b, value) in items {
                    let key = format!("({a}, {b})");
                    check_value(&key, *value)?;
                    if a == b {
                        return Err(AhpError::InvalidJudgment {
                            key,
                            value: *value,
                            reason: "an element cannot be compared with itself",
                        });
                    }
                }
            }
            Judgments::Measured(items) => {
                for MeasuredJudgment(name, value) in items {
                    check_value(name, *value)?;
                }
            }
        }
        Ok(())
    }

    /// Input entries keyed for reporting: `"a, b"` for pairs, the element name otherwise.
    pub fn keyed_entries(&self) -> Vec<(String, f64)> {
        match self {
            Judgments::Ratio(items) => items
                .iter()
                .map(|RatioJudgment(a, b, v)| (format!("{a}, {b}"), *v))
                .collect(),
            Judgments::Measured(items) => {
                items.iter().map(|MeasuredJudgment(n, v)| (n.clone(), *v)).collect()
            }
        }
    }
}

fn check_value(key: &str, value: f64) -> Result<(), AhpError> {
    if !value.is_finite() {
        return Err(AhpError::InvalidJudgment {
            key: key.to_string(),
            value,
            reason: "all input values must be numeric",
        });
    }
    if value <= 0.0 {
        return Err(AhpError::InvalidJudgment {
            key: key.to_string(),
            value,
            reason: "all input values must be greater than zero",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicated_keeps_first_position_and_last_value() {
        let j = Judgments::ratio([("a", "b", 2.0), ("b", "c", 3.0), ("a", "b", 4.0)]);
        let Judgments::Ratio(items) = j.deduplicated() else {
            panic!("expected ratio judgments");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], RatioJudgment("a".into(), "b".into(), 4.0));
        assert_eq!(items[1], RatioJudgment("b".into(), "c".into(), 3.0));
    }

    #[test]
    fn validate_rejects_non_positive_and_non_finite() {
        let zero = Judgments::ratio([("a", "b", 0.0)]);
        match zero.validate() {
            Err(AhpError::InvalidJudgment { key, .. }) => assert_eq!(key, "(a, b)"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(Judgments::measured([("x", -1.0)]).validate().is_err());
        assert!(Judgments::measured([("x", f64::NAN)]).validate().is_err());
        assert!(Judgments::measured([("x", 2.0)]).validate().is_ok());
    }

    #[test]
    fn validate_rejects_self_comparison() {
        assert!(Judgments::ratio([("a", "a", 1.0)]).validate().is_err());
    }

    #[test]
    fn judgments_roundtrip_through_tagged_json() {
        let raw = r#"{"ratio": [["a", "b", 3.0]]}"#;
        let j: Judgments = serde_json::from_str(raw).unwrap();
        assert_eq!(j, Judgments::ratio([("a", "b", 3.0)]));

        let raw = r#"{"measured": [["civic", 34]]}"#;
        let j: Judgments = serde_json::from_str(raw).unwrap();
        assert_eq!(j, Judgments::measured([("civic", 34.0)]));
    }

    #[test]
    fn pair_displays_as_comma_joined() {
        assert_eq!(Pair::new("c", "d").to_string(), "c, d");
        assert_eq!(Pair::new("c", "d").reversed(), Pair::new("d", "c"));
    }
}

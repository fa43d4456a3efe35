//! Serializable node reports.

use serde::Serialize;

use crate::hierarchy::NodeView;
use crate::weights::WeightMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    pub name: String,
    /// Global weight of the node.
    pub weight: f64,
    pub weights: ReportWeights,
    pub consistency_ratio: Option<f64>,
    /// Label of the random index table, when a consistency ratio was computed.
    pub random_index: Option<String>,
    pub elements: ReportElements,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub details: Option<ReportDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportWeights {
    pub local: WeightMap,
    pub global: WeightMap,
    /// Only present on the root of a hierarchy.
    pub target: Option<WeightMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportElements {
    pub count: usize,
    pub names: Vec<String>,
}

/// Extra sections of a verbose report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDetails {
    pub children: Option<ReportChildren>,
    pub comparisons: ReportComparisons,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportChildren {
    pub count: usize,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportComparisons {
    /// Input judgments plus completed comparisons.
    pub count: usize,
    pub input: WeightMap,
    pub computed: Option<WeightMap>,
}

impl NodeReport {
    pub(crate) fn from_view(view: &NodeView<'_>, verbose: bool) -> Self {
        let comparison = view.comparison();
        let names = comparison.elements().to_vec();

        let details = verbose.then(|| {
            let children: Vec<String> = view.children().map(|c| c.name().to_string()).collect();
            let input = WeightMap::from_entries(comparison.judgments().keyed_entries());
            let missing = comparison.missing_comparisons();
            let computed =
                (!missing.is_empty()).then(|| WeightMap::from_entries(missing.keyed_entries()));
            ReportDetails {
                children: (!children.is_empty()).then(|| ReportChildren {
                    count: children.len(),
                    names: children,
                }),
                comparisons: ReportComparisons {
                    count: input.len() + missing.len(),
                    input,
                    computed,
                },
            }
        });

        NodeReport {
            name: view.name().to_string(),
            weight: view.global_weight(),
            weights: ReportWeights {
                local: view.local_weights().clone(),
                global: view.global_weights().clone(),
                target: view.target_weights().cloned(),
            },
            consistency_ratio: view.consistency_ratio(),
            random_index: comparison.random_index().map(|r| r.label().to_string()),
            elements: ReportElements {
                count: names.len(),
                names,
            },
            details,
        }
    }
}

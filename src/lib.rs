#![forbid(unsafe_code)]

//! # ahp-harness
//!
//! Analytic Hierarchy Process engine.
//!
//! Pairwise ratio judgments ("a is 3 times as important as b") are turned into
//! a reciprocal comparison matrix. Missing comparisons are filled by
//! minimizing the matrix's Perron root, priorities come from the principal
//! eigenvector, and the consistency ratio says how coherent the judgments
//! were. Comparisons can be wired into hierarchies whose leaf-level target
//! weights and per-node global weights are kept up to date as children are
//! attached.

pub mod compare;
pub mod completion;
pub mod compose;
pub mod config;
pub mod consistency;
pub mod error;
pub mod hierarchy;
pub mod judgments;
pub mod matrix;
pub mod priority;
pub mod report;
pub mod weights;

pub use compare::{CompareRequest, Comparison};
pub use completion::MissingComparisons;
pub use compose::{Compose, ComposeReport, ComposeRequest, HierarchyLink};
pub use config::{CompareConfig, RandomIndex};
pub use consistency::random_index_value;
pub use error::AhpError;
pub use hierarchy::{Hierarchy, NodeId, NodeView};
pub use judgments::{Judgments, Pair};
pub use report::NodeReport;
pub use weights::WeightMap;

//! Hierarchy composition over an arena of comparisons.
//!
//! Nodes are addressed by [`NodeId`]; each record holds an optional parent id
//! and its child ids. Attaching children triggers a two-phase recompute:
//! 1. climb from the modified node to the root, refreshing node precision and
//!    target weights (children first, so each parent sees fresh child data);
//! 2. walk the root's whole subtree top-down with an explicit stack,
//!    refreshing global weights.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compare::Comparison;
use crate::config::round_to;
use crate::error::AhpError;
use crate::report::NodeReport;
use crate::weights::WeightMap;

/// Stable index of a node inside one [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct NodeRecord {
    comparison: Comparison,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// min(own precision, children's node precision).
    node_precision: u32,
    /// Leaf-level aggregate of this node's subtree.
    node_weights: WeightMap,
    global_weight: f64,
    /// Parent's local weight on this node's name; 1.0 for a root.
    local_weight: f64,
    global_weights: WeightMap,
}

impl NodeRecord {
    fn new(comparison: Comparison) -> Self {
        let local = comparison.local_weights().clone();
        Self {
            node_precision: comparison.precision(),
            node_weights: local.clone(),
            global_weight: 1.0,
            local_weight: 1.0,
            global_weights: local,
            comparison,
            parent: None,
            children: Vec::new(),
        }
    }

    fn reset_as_root(&mut self) {
        self.parent = None;
        self.global_weight = 1.0;
        self.local_weight = 1.0;
        self.global_weights = self.comparison.local_weights().clone();
    }
}

/// Arena of comparisons wired into parent/child trees.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<NodeRecord>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a standalone comparison; it starts as its own root.
    pub fn insert(&mut self, comparison: Comparison) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord::new(comparison));
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeView<'_>> {
        self.nodes.get(id.0).map(|_| NodeView {
            hierarchy: self,
            id,
        })
    }

    /// First node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|r| r.comparison.name() == name)
            .map(NodeId)
    }

    /// Make `children` the complete child set of `parent`.
    ///
    /// Every child's name must be an element of the parent's local weights.
    /// Children previously attached elsewhere are moved; previous children of
    /// `parent` not in the new set are detached and become roots again.
    /// Target and global weights are then recomputed for the whole affected
    /// tree. On error nothing is modified.
    pub fn add_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<(), AhpError> {
        self.validate_children(parent, children)?;

        let previous = std::mem::take(&mut self.nodes[parent.0].children);
        for old in previous {
            if !children.contains(&old) {
                self.nodes[old.0].reset_as_root();
                self.propagate(old);
            }
        }

        for &child in children {
            if let Some(old_parent) = self.nodes[child.0].parent {
                if old_parent != parent {
                    self.nodes[old_parent.0].children.retain(|c| *c != child);
                    self.nodes[child.0].reset_as_root();
                    self.propagate(old_parent);
                }
            }
        }

        // Ordered as the parent's local weights list the child names.
        let mut ordered: Vec<NodeId> = children.to_vec();
        let local = self.nodes[parent.0].comparison.local_weights();
        ordered.sort_by_key(|c| {
            let name = self.nodes[c.0].comparison.name();
            local.keys().position(|k| k == name).unwrap_or(usize::MAX)
        });
        for &child in &ordered {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children = ordered;

        debug!(
            node = self.nodes[parent.0].comparison.name(),
            children = children.len(),
            "children attached"
        );
        self.propagate(parent);
        Ok(())
    }

    fn validate_children(&self, parent: NodeId, children: &[NodeId]) -> Result<(), AhpError> {
        let parent_rec = self.nodes.get(parent.0).ok_or_else(|| AhpError::UnknownNode {
            name: format!("#{}", parent.0),
        })?;
        let parent_name = parent_rec.comparison.name();
        let mut seen: HashSet<&str> = HashSet::new();

        for &child in children {
            let child_rec = self.nodes.get(child.0).ok_or_else(|| AhpError::UnknownNode {
                name: format!("#{}", child.0),
            })?;
            let child_name = child_rec.comparison.name();
            if !seen.insert(child_name) {
                return Err(AhpError::DuplicateNode {
                    name: child_name.to_string(),
                });
            }
            if !parent_rec.comparison.local_weights().contains_key(child_name) {
                return Err(AhpError::HierarchyMismatch {
                    parent: parent_name.to_string(),
                    child: child_name.to_string(),
                });
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(AhpError::HierarchyCycle {
                    parent: parent_name.to_string(),
                    child: child_name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether `candidate` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.nodes[id.0].parent;
        }
        false
    }

    fn root_of(&self, node: NodeId) -> NodeId {
        let mut id = node;
        while let Some(parent) = self.nodes[id.0].parent {
            id = parent;
        }
        id
    }

    /// Phase 1 from `start` up to its root, then phase 2 from the root down.
    fn propagate(&mut self, start: NodeId) {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            self.refresh_node_weights(id);
            cursor = self.nodes[id.0].parent;
        }
        let root = self.root_of(start);
        self.refresh_global_weights(root);
    }

    fn refresh_node_weights(&mut self, id: NodeId) {
        let rec = &self.nodes[id.0];
        let own_precision = rec.comparison.precision();
        let precision = rec
            .children
            .iter()
            .map(|c| self.nodes[c.0].node_precision)
            .fold(own_precision, u32::min);

        let mut acc: Vec<(String, f64)> = Vec::new();
        let mut add = |key: &str, value: f64| match acc.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v += value,
            None => acc.push((key.to_string(), value)),
        };
        for (element, weight) in rec.comparison.local_weights().iter() {
            let child = rec
                .children
                .iter()
                .map(|c| &self.nodes[c.0])
                .find(|c| c.comparison.name() == element);
            match child {
                Some(child) => {
                    for (key, value) in child.node_weights.iter() {
                        add(key, weight * value);
                    }
                }
                None => add(element, weight),
            }
        }

        let sorted = WeightMap::sorted_descending(acc);
        let rounded = sorted
            .into_vec()
            .into_iter()
            .map(|(k, v)| (k, round_to(v, precision)))
            .collect();

        let rec = &mut self.nodes[id.0];
        rec.node_precision = precision;
        rec.node_weights = WeightMap::from_entries(rounded);
    }

    fn refresh_global_weights(&mut self, root: NodeId) {
        {
            let rec = &mut self.nodes[root.0];
            if rec.parent.is_none() {
                rec.global_weight = 1.0;
                rec.local_weight = 1.0;
                rec.global_weights = rec.comparison.local_weights().clone();
            }
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let parent = &self.nodes[id.0];
            let parent_precision = parent.comparison.precision();
            let parent_global = parent.global_weight;
            let updates: Vec<(NodeId, f64)> = parent
                .children
                .iter()
                .map(|c| {
                    let name = self.nodes[c.0].comparison.name();
                    let local = parent.comparison.local_weights().get(name).unwrap_or(0.0);
                    (*c, local)
                })
                .collect();

            for &(child, local) in &updates {
                let rec = &mut self.nodes[child.0];
                rec.local_weight = local;
                rec.global_weight = round_to(parent_global * local, parent_precision);
                let global = rec.global_weight;
                rec.global_weights = WeightMap::from_entries(
                    rec.comparison
                        .local_weights()
                        .iter()
                        .map(|(k, v)| (k.to_string(), round_to(global * v, parent_precision)))
                        .collect(),
                );
            }
            // Reverse so the first child is visited first.
            stack.extend(updates.iter().rev().map(|(c, _)| *c));
        }
    }

    /// Reports of every node in the tree containing `id`, root first, pre-order.
    pub fn complete_report(&self, id: NodeId, verbose: bool) -> Option<Vec<NodeReport>> {
        self.nodes.get(id.0)?;
        let root = self.root_of(id);
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if let Some(view) = self.node(current) {
                out.push(view.report(verbose));
            }
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        Some(out)
    }
}

/// Read-only view of one node and its place in the hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    hierarchy: &'a Hierarchy,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    fn record(&self) -> &'a NodeRecord {
        &self.hierarchy.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.record().comparison.name()
    }

    pub fn comparison(&self) -> &'a Comparison {
        &self.record().comparison
    }

    pub fn local_weights(&self) -> &'a WeightMap {
        self.record().comparison.local_weights()
    }

    pub fn consistency_ratio(&self) -> Option<f64> {
        self.record().comparison.consistency_ratio()
    }

    pub fn missing_comparisons(&self) -> &'a crate::completion::MissingComparisons {
        self.record().comparison.missing_comparisons()
    }

    /// Aggregated leaf weights; only the root of a hierarchy exposes them.
    pub fn target_weights(&self) -> Option<&'a WeightMap> {
        let rec = self.record();
        rec.parent.is_none().then_some(&rec.node_weights)
    }

    /// Importance of this node relative to the root (1.0 for a root).
    pub fn global_weight(&self) -> f64 {
        self.record().global_weight
    }

    /// Parent's local weight on this node (1.0 for a root).
    pub fn local_weight(&self) -> f64 {
        self.record().local_weight
    }

    pub fn global_weights(&self) -> &'a WeightMap {
        &self.record().global_weights
    }

    /// Precision used when aggregating this node's subtree.
    pub fn node_precision(&self) -> u32 {
        self.record().node_precision
    }

    pub fn parent(&self) -> Option<NodeView<'a>> {
        self.record().parent.and_then(|p| self.hierarchy.node(p))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let hierarchy = self.hierarchy;
        self.record()
            .children
            .iter()
            .filter_map(move |c| hierarchy.node(*c))
    }

    pub fn is_root(&self) -> bool {
        self.record().parent.is_none()
    }

    pub fn report(&self, verbose: bool) -> NodeReport {
        NodeReport::from_view(self, verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompareConfig;
    use crate::judgments::Judgments;

    fn ratio(name: &str, items: &[(&str, &str, f64)]) -> Comparison {
        Comparison::new(
            name,
            Judgments::ratio(items.iter().map(|(a, b, v)| (*a, *b, *v))),
            CompareConfig::default(),
        )
        .unwrap()
    }

    fn measured(name: &str, items: &[(&str, f64)]) -> Comparison {
        Comparison::new(
            name,
            Judgments::measured(items.iter().map(|(a, v)| (*a, *v))),
            CompareConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn standalone_node_is_its_own_root() {
        let mut h = Hierarchy::new();
        let id = h.insert(ratio("a", &[("b", "c", 1.0)]));
        let node = h.node(id).unwrap();
        assert!(node.is_root());
        assert_eq!(node.global_weight(), 1.0);
        assert_eq!(node.target_weights(), Some(node.local_weights()));
        assert_eq!(node.global_weights(), node.local_weights());
    }

    #[test]
    fn two_level_hierarchy_aggregates_target_weights() {
        let mut h = Hierarchy::new();
        let a = h.insert(ratio("a", &[("b", "c", 1.0)]));
        let b = h.insert(measured("b", &[("x", 1.0), ("y", 3.0)]));
        let c = h.insert(measured("c", &[("x", 3.0), ("y", 1.0)]));
        h.add_children(a, &[b, c]).unwrap();

        let root = h.node(a).unwrap();
        let target = root.target_weights().unwrap();
        assert_eq!(target.get("x"), Some(0.5));
        assert_eq!(target.get("y"), Some(0.5));
        assert!(h.node(b).unwrap().target_weights().is_none());
        assert_eq!(h.node(b).unwrap().global_weight(), 0.5);
        assert_eq!(h.node(b).unwrap().global_weights().get("y"), Some(0.375));
    }

    #[test]
    fn unmatched_elements_pass_through_as_leaves() {
        let mut h = Hierarchy::new();
        let a = h.insert(measured("a", &[("b", 3.0), ("leaf", 1.0)]));
        let b = h.insert(measured("b", &[("x", 1.0), ("y", 1.0)]));
        h.add_children(a, &[b]).unwrap();
        let target = h.node(a).unwrap().target_weights().unwrap().clone();
        assert_eq!(target.get("x"), Some(0.375));
        assert_eq!(target.get("y"), Some(0.375));
        assert_eq!(target.get("leaf"), Some(0.25));
    }

    #[test]
    fn mismatched_child_is_rejected_without_changes() {
        let mut h = Hierarchy::new();
        let a = h.insert(ratio("a", &[("b", "c", 1.0)]));
        let z = h.insert(measured("z", &[("x", 1.0)]));
        let err = h.add_children(a, &[z]).unwrap_err();
        assert!(matches!(err, AhpError::HierarchyMismatch { .. }));
        assert!(h.node(z).unwrap().is_root());
        assert_eq!(h.node(a).unwrap().children().count(), 0);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut h = Hierarchy::new();
        let a = h.insert(ratio("a", &[("b", "x", 1.0)]));
        let b = h.insert(ratio("b", &[("a", "y", 1.0)]));
        h.add_children(a, &[b]).unwrap();
        let err = h.add_children(b, &[a]).unwrap_err();
        assert!(matches!(err, AhpError::HierarchyCycle { .. }));
    }

    #[test]
    fn replacing_children_detaches_the_old_ones() {
        let mut h = Hierarchy::new();
        let a = h.insert(ratio("a", &[("b", "c", 3.0)]));
        let b = h.insert(measured("b", &[("x", 1.0), ("y", 1.0)]));
        let c = h.insert(measured("c", &[("x", 1.0), ("y", 3.0)]));
        h.add_children(a, &[b, c]).unwrap();
        assert_eq!(h.node(b).unwrap().global_weight(), 0.75);

        h.add_children(a, &[c]).unwrap();
        let old = h.node(b).unwrap();
        assert!(old.is_root());
        assert_eq!(old.global_weight(), 1.0);
        assert!(old.target_weights().is_some());

        let root = h.node(a).unwrap();
        // "b" now passes through as a leaf.
        assert_eq!(root.target_weights().unwrap().get("b"), Some(0.75));
    }

    #[test]
    fn deep_attachment_repropagates_to_root() {
        let mut h = Hierarchy::new();
        let a = h.insert(ratio("a", &[("b", "c", 1.0)]));
        let b = h.insert(ratio("b", &[("d", "e", 4.0)]));
        let c = h.insert(measured("c", &[("x", 1.0)]));
        h.add_children(a, &[b, c]).unwrap();
        assert_eq!(h.node(a).unwrap().target_weights().unwrap().get("d"), Some(0.4));

        let d = h.insert(measured("d", &[("x", 1.0), ("y", 1.0)]));
        h.add_children(b, &[d]).unwrap();
        let target = h.node(a).unwrap().target_weights().unwrap().clone();
        assert!(target.get("d").is_none());
        assert_eq!(target.get("x"), Some(0.7));
        assert_eq!(target.get("y"), Some(0.2));
        assert_eq!(target.get("e"), Some(0.1));
        assert_eq!(h.node(d).unwrap().global_weight(), 0.4);
    }

    #[test]
    fn node_precision_is_lowest_in_subtree() {
        let mut h = Hierarchy::new();
        let a = h.insert(ratio("a", &[("b", "c", 1.0)]));
        let b = h.insert(
            Comparison::new(
                "b",
                Judgments::measured([("x", 1.0), ("y", 2.0)]),
                CompareConfig::default().with_precision(2),
            )
            .unwrap(),
        );
        h.add_children(a, &[b]).unwrap();
        assert_eq!(h.node(a).unwrap().node_precision(), 2);
        assert_eq!(h.node(b).unwrap().node_precision(), 2);
    }
}

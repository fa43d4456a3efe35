//! Name-keyed registry over a [`Hierarchy`].
//!
//! `Compose` lets callers build a multi-level model by comparison name and
//! wire it with a parent -> children map instead of juggling [`NodeId`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compare::{CompareRequest, Comparison};
use crate::config::CompareConfig;
use crate::error::AhpError;
use crate::hierarchy::{Hierarchy, NodeId, NodeView};
use crate::judgments::Judgments;
use crate::report::NodeReport;

/// One `parent -> children` link of a hierarchy map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLink {
    pub parent: String,
    pub children: Vec<String>,
}

/// Report of a single node, or of every node in a hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComposeReport {
    Node(Box<NodeReport>),
    Complete(Vec<NodeReport>),
}

#[derive(Debug, Clone, Default)]
pub struct Compose {
    hierarchy: Hierarchy,
    by_name: HashMap<String, NodeId>,
    order: Vec<String>,
    first_parent: Option<String>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register one comparison.
    pub fn add_comparison(
        &mut self,
        name: impl Into<String>,
        judgments: Judgments,
        config: CompareConfig,
    ) -> Result<NodeId, AhpError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(AhpError::DuplicateNode { name });
        }
        let comparison = Comparison::new(name, judgments, config)?;
        self.add_node(comparison)
    }

    /// Register an already built comparison. Names must be unique.
    pub fn add_node(&mut self, comparison: Comparison) -> Result<NodeId, AhpError> {
        let name = comparison.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(AhpError::DuplicateNode { name });
        }
        let id = self.hierarchy.insert(comparison);
        self.by_name.insert(name.clone(), id);
        self.order.push(name);
        Ok(id)
    }

    pub fn add_nodes<I>(&mut self, comparisons: I) -> Result<Vec<NodeId>, AhpError>
    where
        I: IntoIterator<Item = Comparison>,
    {
        comparisons.into_iter().map(|c| self.add_node(c)).collect()
    }

    /// Build every request, then register them in order.
    pub fn add_requests<I>(&mut self, requests: I) -> Result<Vec<NodeId>, AhpError>
    where
        I: IntoIterator<Item = CompareRequest>,
    {
        let built = requests
            .into_iter()
            .map(CompareRequest::build)
            .collect::<Result<Vec<_>, _>>()?;
        self.add_nodes(built)
    }

    /// Attach children to parents, link by link.
    ///
    /// All or nothing: links are applied to a copy of the hierarchy, which
    /// replaces the current one only if every link succeeds. The first parent
    /// ever linked becomes the default subject of [`Compose::report`].
    pub fn add_hierarchy<I>(&mut self, links: I) -> Result<(), AhpError>
    where
        I: IntoIterator<Item = HierarchyLink>,
    {
        let mut staged = self.hierarchy.clone();
        let mut first_parent = None;
        for link in links {
            let parent = self.resolve(&link.parent)?;
            let children = link
                .children
                .iter()
                .map(|c| self.resolve(c))
                .collect::<Result<Vec<_>, _>>()?;
            staged.add_children(parent, &children)?;
            debug!(node = %link.parent, children = children.len(), "hierarchy link applied");
            first_parent.get_or_insert(link.parent);
        }

        self.hierarchy = staged;
        if self.first_parent.is_none() {
            self.first_parent = first_parent;
        }
        Ok(())
    }

    pub fn node(&self, name: &str) -> Result<NodeView<'_>, AhpError> {
        let id = self.resolve(name)?;
        self.hierarchy.node(id).ok_or_else(|| AhpError::UnknownNode {
            name: name.to_string(),
        })
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Node names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Report one node, or with `None` the complete hierarchy starting from
    /// the root above the first linked parent (the first registered node when
    /// no hierarchy was added).
    pub fn report(&self, name: Option<&str>, verbose: bool) -> Result<ComposeReport, AhpError> {
        match name {
            Some(name) => Ok(ComposeReport::Node(Box::new(self.node(name)?.report(verbose)))),
            None => {
                let subject = self
                    .first_parent
                    .as_deref()
                    .or_else(|| self.order.first().map(String::as_str))
                    .ok_or_else(|| AhpError::UnknownNode {
                        name: "<empty>".to_string(),
                    })?;
                let id = self.resolve(subject)?;
                let reports = self
                    .hierarchy
                    .complete_report(id, verbose)
                    .ok_or_else(|| AhpError::UnknownNode {
                        name: subject.to_string(),
                    })?;
                Ok(ComposeReport::Complete(reports))
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<NodeId, AhpError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| AhpError::UnknownNode {
                name: name.to_string(),
            })
    }
}

/// JSON input of a composed model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub comparisons: Vec<CompareRequest>,
    #[serde(default)]
    pub hierarchy: Vec<HierarchyLink>,
}

impl ComposeRequest {
    pub fn build(self) -> Result<Compose, AhpError> {
        let mut compose = Compose::new();
        compose.add_requests(self.comparisons)?;
        compose.add_hierarchy(self.hierarchy)?;
        Ok(compose)
    }
}

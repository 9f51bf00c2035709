//! Collapse and expand.
//!
//! Collapsing keeps the children in the tree, hidden and out of layout;
//! the container shrinks to its minimum size and remembers the size it had.
//! Expanding restores that size unless the hidden content changed meanwhile.

use std::collections::BTreeSet;

use crate::error::{LayoutError, Result};

use super::Diagram;
use super::types::{CollapseState, ContainerData, NodeId};

impl Diagram {
    /// Flip the collapse state. Returns the new state.
    pub fn toggle(&mut self, id: NodeId) -> Result<CollapseState> {
        if self.container_of(id)?.is_collapsed() {
            self.expand(id)?;
            Ok(CollapseState::Expanded)
        } else {
            self.collapse(id)?;
            Ok(CollapseState::Collapsed)
        }
    }

    pub fn collapse(&mut self, id: NodeId) -> Result<()> {
        if self.container_of(id)?.is_collapsed() {
            return Ok(());
        }
        let node = self.tree.node_mut(id)?;
        let size = node.size;
        let parent = node.parent;
        if let Some(data) = node.container_mut() {
            data.expanded_size_cache = size.exceeds(data.minimum_size).then_some(size);
            data.content_dirty = false;
            data.state = CollapseState::Collapsed;
            let minimum = data.minimum_size;
            node.size = minimum;
        }
        tracing::debug!(node = %self.tree.key(id), "collapsed");
        self.renderer.collapse_changed(id, CollapseState::Collapsed);

        let mut touched = self.run_layout(|tree, ctx, touched| match parent {
            Some(parent) => tree.content_changed(parent, ctx, touched),
            None => tree.cascade_from(id, ctx, touched),
        });
        touched.insert(id);
        self.finish_pass(&touched, true);
        Ok(())
    }

    /// Expand `id`, first expanding any collapsed ancestor so the node
    /// becomes visible.
    pub fn expand(&mut self, id: NodeId) -> Result<()> {
        self.container_of(id)?;
        let mut pending: Vec<NodeId> = self
            .tree
            .ancestors(id)
            .unwrap_or_default()
            .into_iter()
            .filter(|node| self.tree.get(*node).is_some_and(|n| n.is_collapsed()))
            .collect();
        // Outermost first.
        pending.reverse();

        let mut touched = BTreeSet::new();
        for container in pending {
            touched.extend(self.expand_one(container)?);
        }
        self.finish_pass(&touched, true);
        Ok(())
    }

    fn expand_one(&mut self, id: NodeId) -> Result<BTreeSet<NodeId>> {
        let node = self.tree.node_mut(id)?;
        let parent = node.parent;
        let Some(data) = node.container_mut() else {
            return Ok(BTreeSet::new());
        };
        data.state = CollapseState::Expanded;
        let first_time = !data.materialized;
        data.materialized = true;
        let restore = match data.expanded_size_cache.take() {
            Some(cached) if !data.content_dirty => Some(cached.max(data.minimum_size)),
            _ => None,
        };
        data.content_dirty = false;
        let children = data.children.clone();

        if first_time {
            self.renderer.materialize_children(id, &children);
        }
        self.renderer.collapse_changed(id, CollapseState::Expanded);
        tracing::debug!(node = %self.tree.key(id), restored = restore.is_some(), "expanded");

        let mut touched = self.run_layout(|tree, ctx, touched| {
            for child in &children {
                tree.size_subtree(*child, ctx, touched);
            }
            match (restore, parent) {
                (Some(size), parent) => {
                    if let Some(node) = tree.get_mut(id) {
                        node.size = size;
                    }
                    match parent {
                        Some(parent) => tree.cascade_from(parent, ctx, touched),
                        None => tree.arrange_subtree(id, ctx, touched),
                    }
                }
                (None, _) => tree.cascade_from(id, ctx, touched),
            }
        });
        touched.insert(id);
        Ok(touched)
    }

    /// The container data every collapse transition starts from. A node whose
    /// subtree was removed has no transitions left.
    fn container_of(&self, id: NodeId) -> Result<&ContainerData> {
        if self.tree.was_removed(id) {
            return Err(LayoutError::InvalidCollapseTransition {
                node: self.tree.key(id),
                reason: "its subtree was already destroyed".to_string(),
            });
        }
        let node = self.tree.node(id)?;
        node.container().ok_or_else(|| LayoutError::NotAContainer {
            id: node.key.clone(),
        })
    }
}

use std::collections::HashMap;

use crate::error::{LayoutError, Result};

use super::types::{Node, NodeId};

/// Node arena. Parents own their children through `ContainerData::children`;
/// the `parent` field of a node is a plain index used only to walk upward.
#[derive(Debug, Default)]
pub(crate) struct Tree {
    nodes: Vec<Option<Node>>,
    index: HashMap<String, NodeId>,
    root: Option<NodeId>,
}

impl Tree {
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Add `node` under its `parent` (or as the root), appended after any
    /// existing siblings.
    pub(crate) fn insert(&mut self, node: Node) -> Result<NodeId> {
        if self.index.contains_key(&node.key) {
            return Err(LayoutError::DuplicateNodeId { id: node.key });
        }
        let id = NodeId::from_index(self.nodes.len());
        match node.parent {
            Some(parent) => {
                let parent_key = self.key(parent);
                let data = self
                    .get_mut(parent)
                    .and_then(Node::container_mut)
                    .ok_or(LayoutError::NotAContainer { id: parent_key })?;
                data.children.push(id);
            }
            None => self.root = Some(id),
        }
        self.index.insert(node.key.clone(), id);
        self.nodes.push(Some(node));
        Ok(id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or_else(|| LayoutError::UnknownNode {
            id: format!("#{}", id.index()),
        })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or_else(|| LayoutError::UnknownNode {
            id: format!("#{}", id.index()),
        })
    }

    /// The string key of `id`, or `#index` once the node is gone.
    pub(crate) fn key(&self, id: NodeId) -> String {
        self.get(id)
            .map_or_else(|| format!("#{}", id.index()), |node| node.key.clone())
    }

    pub(crate) fn find(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// True for ids that once existed but have been removed.
    pub(crate) fn was_removed(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len() && self.nodes[id.index()].is_none()
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Node::children)
    }

    /// `id` followed by each of its ancestors up to the root. `None` when
    /// `id` (or a link on the way up) no longer exists.
    pub(crate) fn ancestors(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let mut chain = vec![id];
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            // The arena never holds more nodes than this; a longer walk
            // means the parent links form a cycle.
            if chain.len() > self.nodes.len() {
                return None;
            }
            chain.push(parent);
            current = self.get(parent)?;
        }
        Some(chain)
    }

    /// Pre-order walk of the subtree under `id`, `id` first.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Every live node in pre-order from the root.
    pub(crate) fn preorder(&self) -> Vec<NodeId> {
        self.root.map(|root| self.subtree(root)).unwrap_or_default()
    }

    /// Drop `id` and everything under it. Returns the removed nodes.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Vec<(NodeId, Node)> {
        let doomed = self.subtree(id);
        if let Some(parent) = self.get(id).and_then(|node| node.parent)
            && let Some(data) = self.get_mut(parent).and_then(Node::container_mut)
        {
            data.children.retain(|child| *child != id);
        }
        let mut removed = Vec::with_capacity(doomed.len());
        for node_id in doomed {
            if let Some(node) = self.nodes[node_id.index()].take() {
                self.index.remove(&node.key);
                removed.push((node_id, node));
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        removed
    }

    pub(crate) fn live_count(&self) -> usize {
        self.index.len()
    }
}

//! Node status and its aggregation into containers.

use crate::error::Result;

use super::Diagram;
use super::types::{NodeId, Status};

/// Fold leaf statuses the way a container reports them: the most urgent
/// wins, and a container with nothing ranked is `Unknown`.
pub fn aggregate(statuses: impl IntoIterator<Item = Status>) -> Status {
    statuses
        .into_iter()
        .filter_map(|status| Some((status.aggregation_rank()?, status)))
        .max_by_key(|(rank, _)| *rank)
        .map_or(Status::Unknown, |(_, status)| status)
}

impl Diagram {
    /// Set a node's status. With `status_cascade` the change folds into
    /// every ancestor; with `collapse_on_status` settled containers collapse
    /// and anything needing attention is expanded into view.
    pub fn set_status(&mut self, id: NodeId, status: Status) -> Result<()> {
        self.tree.node_mut(id)?.status = status;
        let mut changed = vec![(id, status)];
        if self.config.status_cascade
            && let Some(parent) = self.tree.node(id)?.parent
        {
            changed.extend(self.propagate_status(parent));
        }
        if self.config.collapse_on_status {
            self.apply_status_collapse(&changed)?;
        }
        Ok(())
    }

    /// Recompute the aggregate of `container` and each of its ancestors.
    /// Returns the nodes whose status changed.
    pub(crate) fn propagate_status(&mut self, container: NodeId) -> Vec<(NodeId, Status)> {
        let chain = self.tree.ancestors(container).unwrap_or_default();
        chain
            .into_iter()
            .filter_map(|node| {
                let status = self.aggregate_status(node)?;
                Some((node, status))
            })
            .collect()
    }

    /// Refresh one container from its leaves. `None` when it has no children
    /// (its own status stands) or nothing changed.
    pub(crate) fn aggregate_status(&mut self, id: NodeId) -> Option<Status> {
        if self.tree.children(id).is_empty() {
            return None;
        }
        let leaves = self
            .tree
            .subtree(id)
            .into_iter()
            .skip(1)
            .filter(|node| self.tree.children(*node).is_empty())
            .filter_map(|node| self.tree.get(node).map(|n| n.status));
        let status = aggregate(leaves);
        let node = self.tree.get_mut(id)?;
        if node.status == status {
            return None;
        }
        tracing::trace!(node = %node.key, from = ?node.status, to = ?status, "status aggregated");
        node.status = status;
        Some(status)
    }

    pub(crate) fn aggregate_all_statuses(&mut self) {
        for node in self.tree.preorder().into_iter().rev() {
            self.aggregate_status(node);
        }
    }

    fn apply_status_collapse(&mut self, changed: &[(NodeId, Status)]) -> Result<()> {
        for (id, status) in changed {
            let Some(node) = self.tree.get(*id) else {
                continue;
            };
            if status.is_settled() {
                if node.is_container() && !node.is_collapsed() {
                    self.collapse(*id)?;
                }
            } else if node.is_container() {
                self.expand(*id)?;
            } else if let Some(parent) = node.parent {
                self.expand(parent)?;
            }
        }
        Ok(())
    }
}

//! Upward (content to container) and downward (container to content)
//! size propagation.

use std::collections::BTreeSet;

use crate::arrange::{ChildBox, ContainerRef, LayoutContext};
use crate::geometry::{Point, Size, apply_zones, outer_size};

use super::tree::Tree;
use super::types::{NodeBody, NodeId};

impl Tree {
    /// Size a node offers to its parent's strategy. Leaves offer their
    /// intrinsic size so sibling-derived sizes never feed back.
    pub(crate) fn natural_size(&self, id: NodeId) -> Size {
        match self.get(id).map(|node| (&node.body, node.size)) {
            Some((NodeBody::Leaf { intrinsic, .. }, _)) => *intrinsic,
            Some((NodeBody::Container(_), size)) => size,
            None => Size::ZERO,
        }
    }

    /// Strategy input for `id`: empty while collapsed.
    pub(crate) fn child_boxes(&self, id: NodeId) -> Vec<ChildBox> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        if node.is_collapsed() {
            return Vec::new();
        }
        node.children()
            .iter()
            .filter_map(|child| {
                let child_node = self.get(*child)?;
                Some(ChildBox {
                    id: *child,
                    size: self.natural_size(*child),
                    position: child_node.position,
                    role: child_node.role,
                })
            })
            .collect()
    }

    /// Required content plus margins and header, floored at the minimum
    /// size; the minimum size itself while collapsed.
    pub(crate) fn target_size(&self, id: NodeId, ctx: &mut LayoutContext<'_>) -> Option<Size> {
        let node = self.get(id)?;
        let data = node.container()?;
        if data.is_collapsed() {
            return Some(data.minimum_size);
        }
        let boxes = self.child_boxes(id);
        let required =
            data.arrangement
                .required_size(ContainerRef::new(id, &node.key), &boxes, ctx);
        Some(outer_size(required, &data.margins, data.header_height).max(data.minimum_size))
    }

    /// Recompute the size of `id`. Returns whether it changed.
    pub(crate) fn refresh_size(&mut self, id: NodeId, ctx: &mut LayoutContext<'_>) -> bool {
        let target = match self.get(id).map(|node| &node.body) {
            Some(NodeBody::Leaf { intrinsic, .. }) => *intrinsic,
            Some(NodeBody::Container(_)) => match self.target_size(id, ctx) {
                Some(size) => size,
                None => return false,
            },
            None => return false,
        };
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        if node.size.approx_eq(target) {
            return false;
        }
        tracing::trace!(node = %node.key, from = ?node.size, to = ?target, "resize");
        node.size = target;
        true
    }

    /// Bottom-up sizing of a whole subtree.
    pub(crate) fn size_subtree(
        &mut self,
        id: NodeId,
        ctx: &mut LayoutContext<'_>,
        touched: &mut BTreeSet<NodeId>,
    ) {
        for node in self.subtree(id).into_iter().rev() {
            if self.refresh_size(node, ctx) {
                touched.insert(node);
            }
        }
    }

    /// Position the children of `id` inside its inner-content zone.
    fn arrange_children(
        &mut self,
        id: NodeId,
        ctx: &mut LayoutContext<'_>,
        touched: &mut BTreeSet<NodeId>,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };
        let Some(data) = node.container() else {
            return;
        };
        if data.is_collapsed() {
            return;
        }
        let zones = apply_zones(node.size, &data.margins, data.header_height);
        let boxes = self.child_boxes(id);
        let arrangement =
            data.arrangement
                .arrange(ContainerRef::new(id, &node.key), &boxes, zones.inner, ctx);

        for (child, placement) in arrangement {
            let center = zones.inner.origin()
                + placement.offset
                + Point::new(placement.size.width / 2.0, placement.size.height / 2.0);
            let Some(child_node) = self.get_mut(child) else {
                continue;
            };
            let size = match child_node.container() {
                Some(child_data) => placement.size.max(child_data.minimum_size),
                None => placement.size,
            };
            if !child_node.position.approx_eq(center) || !child_node.size.approx_eq(size) {
                child_node.position = center;
                child_node.size = size;
                touched.insert(child);
            }
        }
    }

    /// Downward pass: arrange `id` and every expanded container below it.
    /// Subtrees of collapsed containers are layout-inert and skipped.
    pub(crate) fn arrange_subtree(
        &mut self,
        id: NodeId,
        ctx: &mut LayoutContext<'_>,
        touched: &mut BTreeSet<NodeId>,
    ) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            if !node.is_container() || node.is_collapsed() {
                continue;
            }
            self.arrange_children(current, ctx, touched);
            stack.extend(self.children(current).iter().rev().copied());
        }
    }

    /// One structural event: walk up from `start` while sizes keep changing,
    /// then arrange down from the highest container reached.
    pub(crate) fn cascade_from(
        &mut self,
        start: NodeId,
        ctx: &mut LayoutContext<'_>,
        touched: &mut BTreeSet<NodeId>,
    ) {
        let _span = tracing::debug_span!("cascade", start = %self.key(start)).entered();
        let mut current = start;
        loop {
            let changed = self.refresh_size(current, ctx);
            if changed {
                touched.insert(current);
            }
            if current != start
                && let Some(data) = self.get_mut(current).and_then(|n| n.container_mut())
                && data.is_collapsed()
            {
                data.content_dirty = true;
            }
            match self.get(current).and_then(|node| node.parent) {
                Some(parent) if changed => current = parent,
                _ => break,
            }
        }
        self.arrange_subtree(current, ctx, touched);
    }

    /// The child list of `container` changed (added, removed, or a child
    /// collapsed). A collapsed container can no longer trust its cached
    /// expanded size.
    pub(crate) fn content_changed(
        &mut self,
        container: NodeId,
        ctx: &mut LayoutContext<'_>,
        touched: &mut BTreeSet<NodeId>,
    ) {
        if let Some(data) = self.get_mut(container).and_then(|n| n.container_mut())
            && data.is_collapsed()
        {
            data.content_dirty = true;
        }
        self.cascade_from(container, ctx, touched);
    }
}

//! Edge resolution and render-time routing.
//!
//! An edge lives in its joint container: the nearest container holding both
//! endpoints. Each endpoint reaches the joint's frame by adding up the
//! positions of the containers on its chain, so no node ever needs a global
//! coordinate.

use std::collections::{BTreeSet, HashSet};

use crate::arrange::ArrangementKind;
use crate::error::{EdgeResolutionFailure, LayoutError, Result};
use crate::geometry::Point;

use super::Diagram;
use super::tree::Tree;
use super::types::{Edge, EdgeId, EdgeRoute, EdgeStatus, Node, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub joint: NodeId,
    /// Containers strictly between the source and the joint, nearest first.
    pub source_chain: Vec<NodeId>,
    pub target_chain: Vec<NodeId>,
}

impl Tree {
    fn rooted_ancestors(&self, id: NodeId) -> std::result::Result<Vec<NodeId>, EdgeResolutionFailure> {
        let unreachable = || EdgeResolutionFailure::Unreachable { node: self.key(id) };
        let chain = self.ancestors(id).ok_or_else(unreachable)?;
        if chain.last().copied() != self.root() {
            return Err(unreachable());
        }
        Ok(chain)
    }

    pub(crate) fn resolve(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> std::result::Result<Resolution, EdgeResolutionFailure> {
        if source == target {
            return Err(EdgeResolutionFailure::SelfLoop {
                node: self.key(source),
            });
        }
        let source_up = self.rooted_ancestors(source)?;
        let target_up = self.rooted_ancestors(target)?;
        let target_set: HashSet<NodeId> = target_up.iter().copied().collect();

        // Both lists end at the root, so a common node always exists.
        let source_idx = source_up
            .iter()
            .position(|id| target_set.contains(id))
            .ok_or_else(|| EdgeResolutionFailure::Unreachable {
                node: self.key(target),
            })?;
        let joint = source_up[source_idx];
        let target_idx = target_up
            .iter()
            .position(|id| *id == joint)
            .unwrap_or(target_up.len());

        Ok(Resolution {
            joint,
            source_chain: source_up.iter().take(source_idx).skip(1).copied().collect(),
            target_chain: target_up.iter().take(target_idx).skip(1).copied().collect(),
        })
    }

    fn position_of(&self, id: NodeId) -> Point {
        self.get(id).map_or(Point::ORIGIN, |node| node.position)
    }

    /// Offset, anchor and anchor point of one edge end.
    fn route_end(&self, endpoint: NodeId, chain: &[NodeId], joint: NodeId) -> (Point, NodeId, Point) {
        let offset = chain
            .iter()
            .fold(Point::ORIGIN, |acc, id| acc + self.position_of(*id));
        if endpoint == joint {
            return (offset, endpoint, Point::ORIGIN);
        }
        // Scanning from the joint side finds the outermost collapsed one.
        match chain
            .iter()
            .rposition(|id| self.get(*id).is_some_and(Node::is_collapsed))
        {
            Some(idx) => {
                let point = chain[idx..]
                    .iter()
                    .fold(Point::ORIGIN, |acc, id| acc + self.position_of(*id));
                (offset, chain[idx], point)
            }
            None => (offset, endpoint, self.position_of(endpoint) + offset),
        }
    }

    pub(crate) fn route(&self, edge: &Edge) -> EdgeRoute {
        let (source_offset, source_anchor, source_point) =
            self.route_end(edge.source, &edge.source_chain, edge.joint);
        let (target_offset, target_anchor, target_point) =
            self.route_end(edge.target, &edge.target_chain, edge.joint);
        let visible = self
            .ancestors(edge.joint)
            .is_some_and(|chain| chain.iter().all(|id| self.get(*id).is_some_and(|n| !n.is_collapsed())));
        EdgeRoute {
            source_offset,
            target_offset,
            source_anchor,
            target_anchor,
            source_point,
            target_point,
            visible,
        }
    }
}

impl Diagram {
    /// Connect `source` to `target`. Adding the same source, target and kind
    /// twice returns the first edge.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, kind: &str) -> Result<EdgeId> {
        let (id, created) = self.insert_edge(source, target, kind)?;
        if created {
            self.relayout_joint(id);
        }
        Ok(id)
    }

    /// [`Diagram::add_edge`] by node keys.
    pub fn connect(&mut self, source: &str, target: &str, kind: &str) -> Result<EdgeId> {
        let source = self.lookup_endpoint(source)?;
        let target = self.lookup_endpoint(target)?;
        self.add_edge(source, target, kind)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        let edge = self.detach_edge(id)?;
        if self.is_delegated(edge.joint) {
            let joint = edge.joint;
            let touched =
                self.run_layout(|tree, ctx, touched| tree.cascade_from(joint, ctx, touched));
            self.finish_pass(&touched, false);
        }
        Ok(())
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(LayoutError::UnknownEdge { id: id.index() })
    }

    pub fn find_edge(&self, key: &str) -> Option<EdgeId> {
        self.edge_keys.get(key).copied()
    }

    /// Live edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(idx, edge)| Some((EdgeId::from_index(idx), edge.as_ref()?)))
    }

    pub fn edge_route(&self, id: EdgeId) -> Result<EdgeRoute> {
        Ok(self.edge(id)?.route)
    }

    pub fn set_edge_status(&mut self, id: EdgeId, status: EdgeStatus) -> Result<()> {
        let edge = self
            .edge_slot_mut(id)
            .ok_or(LayoutError::UnknownEdge { id: id.index() })?;
        edge.status = status;
        Ok(())
    }

    pub(crate) fn edge_slot_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Resolve and store an edge without running a layout pass. Returns the
    /// id and whether the edge is new.
    pub(crate) fn insert_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: &str,
    ) -> Result<(EdgeId, bool)> {
        let resolution = self.tree.resolve(source, target)?;
        let source_key = self.tree.key(source);
        let target_key = self.tree.key(target);
        let key = format!("{source_key}--{kind}--{target_key}");
        if let Some(existing) = self.edge_keys.get(&key) {
            return Ok((*existing, false));
        }

        let id = EdgeId::from_index(self.edges.len());
        let mut edge = Edge {
            label: format!("{source_key} --{kind}--> {target_key}"),
            key: key.clone(),
            kind: kind.to_string(),
            source,
            target,
            joint: resolution.joint,
            source_chain: resolution.source_chain,
            target_chain: resolution.target_chain,
            status: EdgeStatus::default(),
            route: EdgeRoute {
                source_offset: Point::ORIGIN,
                target_offset: Point::ORIGIN,
                source_anchor: source,
                target_anchor: target,
                source_point: Point::ORIGIN,
                target_point: Point::ORIGIN,
                visible: true,
            },
        };
        edge.route = self.tree.route(&edge);
        tracing::trace!(edge = %key, joint = %self.tree.key(edge.joint), "edge resolved");

        self.tree.node_mut(source)?.outgoing.insert(id);
        self.tree.node_mut(target)?.incoming.insert(id);
        self.edges.push(Some(edge));
        self.edge_keys.insert(key, id);
        Ok((id, true))
    }

    /// Take an edge out of storage and out of its endpoints' edge sets.
    pub(crate) fn detach_edge(&mut self, id: EdgeId) -> Result<Edge> {
        let edge = self
            .edges
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(LayoutError::UnknownEdge { id: id.index() })?;
        self.edge_keys.remove(&edge.key);
        if let Some(node) = self.tree.get_mut(edge.source) {
            node.outgoing.remove(&id);
        }
        if let Some(node) = self.tree.get_mut(edge.target) {
            node.incoming.remove(&id);
        }
        Ok(edge)
    }

    fn is_delegated(&self, id: NodeId) -> bool {
        self.tree
            .get(id)
            .and_then(Node::container)
            .is_some_and(|data| matches!(data.arrangement, ArrangementKind::Delegated(_)))
    }

    /// A new link changes what a Delegated joint's provider sees.
    fn relayout_joint(&mut self, id: EdgeId) {
        let Some(joint) = self.edge(id).ok().map(|edge| edge.joint) else {
            return;
        };
        if !self.is_delegated(joint) {
            return;
        }
        let touched = self.run_layout(|tree, ctx, touched| tree.cascade_from(joint, ctx, touched));
        self.finish_pass(&touched, false);
    }

    /// Recompute routes of edges whose endpoints, chains or joint are in
    /// `touched`; every edge when `touched` is `None`.
    pub(crate) fn refresh_routes(&mut self, touched: Option<&BTreeSet<NodeId>>) {
        let tree = &self.tree;
        for edge in self.edges.iter_mut().flatten() {
            let affected = touched.is_none_or(|touched| {
                touched.contains(&edge.source)
                    || touched.contains(&edge.target)
                    || touched.contains(&edge.joint)
                    || edge.source_chain.iter().any(|id| touched.contains(id))
                    || edge.target_chain.iter().any(|id| touched.contains(id))
            });
            if affected {
                edge.route = tree.route(edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::NodeSpec;
    use crate::measure::FixedMeasurer;

    fn nested() -> Diagram {
        let spec = NodeSpec::new("g", "group").with_children(vec![
            NodeSpec::new("a", "lane").with_children(vec![NodeSpec::leaf("x", 40.0, 20.0)]),
            NodeSpec::new("b", "lane").with_children(vec![
                NodeSpec::new("b2", "lane").with_children(vec![NodeSpec::leaf("y", 40.0, 20.0)]),
            ]),
        ]);
        Diagram::with_measurer(
            &spec,
            LayoutConfig::default(),
            Box::new(FixedMeasurer::new(8.0, 16.0)),
        )
        .unwrap()
    }

    fn id(diagram: &Diagram, key: &str) -> NodeId {
        diagram.find(key).unwrap()
    }

    #[test]
    fn chains_stop_below_the_joint() {
        let diagram = nested();
        let resolution = diagram.tree.resolve(id(&diagram, "x"), id(&diagram, "y")).unwrap();
        assert_eq!(resolution.joint, id(&diagram, "g"));
        assert_eq!(resolution.source_chain, vec![id(&diagram, "a")]);
        assert_eq!(
            resolution.target_chain,
            vec![id(&diagram, "b2"), id(&diagram, "b")]
        );
    }

    #[test]
    fn an_ancestor_endpoint_is_its_own_joint() {
        let diagram = nested();
        let resolution = diagram.tree.resolve(id(&diagram, "b"), id(&diagram, "y")).unwrap();
        assert_eq!(resolution.joint, id(&diagram, "b"));
        assert!(resolution.source_chain.is_empty());
        assert_eq!(resolution.target_chain, vec![id(&diagram, "b2")]);
    }

    #[test]
    fn self_loops_are_rejected() {
        let mut diagram = nested();
        let x = id(&diagram, "x");
        let err = diagram.add_edge(x, x, "flow").unwrap_err();
        assert_eq!(
            err,
            LayoutError::EdgeResolution(EdgeResolutionFailure::SelfLoop {
                node: "x".to_string()
            })
        );
        assert!(diagram.node(x).unwrap().outgoing().is_empty());
    }

    #[test]
    fn removed_endpoints_are_unreachable() {
        let mut diagram = nested();
        let x = id(&diagram, "x");
        let y = id(&diagram, "y");
        diagram.remove_node(y).unwrap();
        let err = diagram.add_edge(x, y, "flow").unwrap_err();
        assert!(matches!(
            err,
            LayoutError::EdgeResolution(EdgeResolutionFailure::Unreachable { .. })
        ));
        assert!(diagram.node(x).unwrap().outgoing().is_empty());
    }

    #[test]
    fn duplicate_edges_return_the_original() {
        let mut diagram = nested();
        let first = diagram.connect("x", "y", "flow").unwrap();
        let again = diagram.connect("x", "y", "flow").unwrap();
        let other = diagram.connect("x", "y", "lineage").unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
        let edge = diagram.edge(first).unwrap();
        assert_eq!(edge.key(), "x--flow--y");
        assert_eq!(edge.label(), "x --flow--> y");
        assert_eq!(diagram.find_edge("x--lineage--y"), Some(other));
    }

    #[test]
    fn points_are_in_the_joint_frame() {
        let mut diagram = nested();
        let edge = diagram.connect("x", "y", "flow").unwrap();
        let route = diagram.edge_route(edge).unwrap();
        let pos = |key: &str| diagram.node(id(&diagram, key)).unwrap().position();

        assert_eq!(route.source_offset, pos("a"));
        assert_eq!(route.source_point, pos("x") + pos("a"));
        assert_eq!(route.target_offset, pos("b2") + pos("b"));
        assert_eq!(route.target_point, pos("y") + route.target_offset);
        assert_eq!(route.source_anchor, id(&diagram, "x"));
        assert!(route.visible);
    }

    #[test]
    fn removing_an_edge_clears_endpoint_sets() {
        let mut diagram = nested();
        let edge = diagram.connect("x", "y", "flow").unwrap();
        diagram.remove_edge(edge).unwrap();
        assert!(diagram.node(id(&diagram, "x")).unwrap().outgoing().is_empty());
        assert!(diagram.node(id(&diagram, "y")).unwrap().incoming().is_empty());
        assert!(diagram.find_edge("x--flow--y").is_none());
        assert_eq!(
            diagram.remove_edge(edge),
            Err(LayoutError::UnknownEdge { id: edge.index() })
        );
    }
}

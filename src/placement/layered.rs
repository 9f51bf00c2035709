use std::collections::{BTreeMap, HashSet};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use crate::config::LayeredConfig;
use crate::diagram::NodeId;
use crate::geometry::Point;

use super::{PlacementLink, PlacementNode, PlacementProvider};

/// Left-to-right ranked layout computed by dagre. Links point from lower to
/// higher ranks; `rank_gap` separates ranks and `node_gap` separates the
/// members of one rank.
#[derive(Debug, Clone)]
pub struct LayeredPlacement {
    config: LayeredConfig,
}

impl LayeredPlacement {
    pub fn new(config: LayeredConfig) -> Self {
        Self { config }
    }
}

fn dagre_key(id: NodeId) -> String {
    format!("n{}", id.index())
}

impl PlacementProvider for LayeredPlacement {
    fn compute_positions(
        &mut self,
        nodes: &[PlacementNode],
        links: &[PlacementLink],
    ) -> BTreeMap<NodeId, Point> {
        let mut out = BTreeMap::new();
        if nodes.is_empty() {
            return out;
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some("lr".to_string());
        graph_config.nodesep = Some(self.config.node_gap);
        graph_config.ranksep = Some(self.config.rank_gap);
        graph_config.marginx = Some(0.0);
        graph_config.marginy = Some(0.0);
        dagre_graph.set_graph(graph_config);

        let mut node_set: HashSet<NodeId> = HashSet::new();
        for placed in nodes {
            let mut node = DagreNode::default();
            node.width = placed.size.width;
            node.height = placed.size.height;
            dagre_graph.set_node(dagre_key(placed.id), Some(node));
            node_set.insert(placed.id);
        }

        let mut edge_set: HashSet<(NodeId, NodeId)> = HashSet::new();
        for link in links {
            if link.source == link.target
                || !node_set.contains(&link.source)
                || !node_set.contains(&link.target)
                || !edge_set.insert((link.source, link.target))
            {
                continue;
            }
            let from = dagre_key(link.source);
            let to = dagre_key(link.target);
            let _ = dagre_graph.set_edge(&from, &to, Some(DagreEdge::default()), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        for placed in nodes {
            let Some(dagre_node) = dagre_graph.node(&dagre_key(placed.id)) else {
                continue;
            };
            out.insert(placed.id, Point::new(dagre_node.x, dagre_node.y));
        }
        out
    }
}

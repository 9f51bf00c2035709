use crate::diagram::{CollapseState, Diagram, EdgeRoute, Node, NodeId, Status};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializable snapshot of a laid-out diagram. Node coordinates stay in
/// the parent's frame and edge points in the joint's frame, exactly as the
/// engine keeps them.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub root: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub parent: Option<String>,
    pub kind: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub collapsed: bool,
    pub status: Status,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub kind: String,
    pub source: String,
    pub target: String,
    pub joint: String,
    pub source_chain: Vec<String>,
    pub target_chain: Vec<String>,
    pub source_anchor: String,
    pub target_anchor: String,
    pub source_point: [f32; 2],
    pub target_point: [f32; 2],
    pub visible: bool,
}

impl LayoutDump {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let key = |id: NodeId| -> String {
            diagram
                .node(id)
                .map(|node| node.key().to_string())
                .unwrap_or_default()
        };

        let nodes = diagram
            .nodes()
            .into_iter()
            .filter_map(|id| diagram.node(id).ok())
            .map(|node: &Node| NodeDump {
                id: node.key().to_string(),
                parent: node.parent().map(key),
                kind: node.variant().as_str().to_string(),
                label: node.display_label().to_string(),
                x: node.position().x,
                y: node.position().y,
                width: node.size().width,
                height: node.size().height,
                collapsed: node.collapse_state() == CollapseState::Collapsed,
                status: node.status(),
                role: node.role().map(|role| role.as_str().to_string()),
            })
            .collect();

        let edges = diagram
            .edges()
            .map(|(_, edge)| {
                let route: &EdgeRoute = edge.route();
                EdgeDump {
                    id: edge.key().to_string(),
                    kind: edge.kind().to_string(),
                    source: key(edge.source()),
                    target: key(edge.target()),
                    joint: key(edge.joint()),
                    source_chain: edge.source_chain().iter().map(|id| key(*id)).collect(),
                    target_chain: edge.target_chain().iter().map(|id| key(*id)).collect(),
                    source_anchor: key(route.source_anchor),
                    target_anchor: key(route.target_anchor),
                    source_point: [route.source_point.x, route.source_point.y],
                    target_point: [route.target_point.x, route.target_point.y],
                    visible: route.visible,
                }
            })
            .collect();

        let (root, size) = diagram
            .node(diagram.root())
            .map(|node| (node.key().to_string(), node.size()))
            .unwrap_or_default();

        LayoutDump {
            root,
            width: size.width,
            height: size.height,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, diagram: &Diagram) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let dump = LayoutDump::from_diagram(diagram);
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::NodeSpec;
    use crate::measure::FixedMeasurer;

    #[test]
    fn dump_names_nodes_by_key() {
        let spec = NodeSpec::new("lane", "lane").with_children(vec![
            NodeSpec::leaf("a", 40.0, 20.0),
            NodeSpec::leaf("b", 40.0, 20.0),
        ]);
        let mut diagram = Diagram::with_measurer(
            &spec,
            LayoutConfig::default(),
            Box::new(FixedMeasurer::new(8.0, 16.0)),
        )
        .unwrap();
        diagram.connect("a", "b", "flow").unwrap();

        let dump = LayoutDump::from_diagram(&diagram);
        assert_eq!(dump.root, "lane");
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.nodes[1].parent.as_deref(), Some("lane"));
        assert_eq!(dump.edges[0].joint, "lane");
        assert!(dump.edges[0].source_chain.is_empty());

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["nodes"][0]["kind"], "lane");
        assert_eq!(json["edges"][0]["id"], "a--flow--b");
    }
}

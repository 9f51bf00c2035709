//! Input document: a tree of node specs plus edges, as loaded from JSON5.

use serde::Deserialize;
use std::path::Path;

use crate::config::{ConfigFile, MarginsFile};
use crate::geometry::Size;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    #[serde(default)]
    pub settings: Option<ConfigFile>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl DiagramDocument {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        Ok(json5::from_str(input)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub layout: LayoutSpec,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, kind: &str) -> Self {
        Self {
            id: id.into(),
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    pub fn leaf(id: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            layout: LayoutSpec {
                sizing: Some("fixed-size".to_string()),
                ..LayoutSpec::default()
            },
            ..Self::new(id, "rect")
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSpec>) -> Self {
        self.children = children;
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    pub fn label_or_id(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    pub margins: Option<MarginsFile>,
    pub header_height: Option<f32>,
    pub minimum_size: Option<Size>,
    #[serde(default)]
    pub use_root_ratio: bool,
    pub display_mode: Option<String>,
    pub arrangement: Option<u8>,
    pub mode: Option<String>,
    pub orientation: Option<String>,
    pub placement: Option<String>,
    pub sizing: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lenient_documents() {
        let doc = DiagramDocument::parse(
            r#"{
                // comments and trailing commas are fine
                settings: { nodeSpacing: { vertical: 4 } },
                nodes: [
                    { id: "lane", type: "lane", label: "Lane", children: [
                        { id: "a", width: 80, height: 40 },
                        { id: "b", layout: { sizing: "auto-size" } },
                    ]},
                ],
                edges: [ { source: "a", target: "b", type: "flow" } ],
            }"#,
        )
        .unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].children.len(), 2);
        assert_eq!(doc.nodes[0].kind.as_deref(), Some("lane"));
        assert_eq!(doc.edges[0].kind.as_deref(), Some("flow"));
        assert_eq!(
            doc.nodes[0].children[1].layout.sizing.as_deref(),
            Some("auto-size")
        );
        let spacing = doc.settings.unwrap().node_spacing.unwrap();
        assert_eq!(spacing.vertical, 4.0);
        assert_eq!(spacing.horizontal, 20.0);
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(DiagramDocument::parse("{ nodes: [ { label: 'no id' } ] }").is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LayoutError;
use crate::geometry::Margins;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spacing {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            horizontal: 20.0,
            vertical: 10.0,
        }
    }
}

/// Header chrome: label padding, status indicator and the collapse button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderConfig {
    pub min_height: f32,
    pub padding: f32,
    pub text_gap: f32,
    pub indicator_size: f32,
    pub indicator_gap: f32,
    pub button_size: f32,
    pub min_width: f32,
    /// When set, long labels are truncated and the header never demands
    /// more than this width.
    pub max_width: Option<f32>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            min_height: 10.0,
            padding: 4.0,
            text_gap: 8.0,
            indicator_size: 6.0,
            indicator_gap: 4.0,
            button_size: 16.0,
            min_width: 50.0,
            max_width: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConfig {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            font_size: 16.0,
            line_height: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeafConfig {
    pub default_width: f32,
    pub default_height: f32,
    pub label_padding: f32,
    pub auto_min_width: f32,
    pub circle_radius: f32,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self {
            default_width: 150.0,
            default_height: 20.0,
            label_padding: 20.0,
            auto_min_width: 60.0,
            circle_radius: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    pub slot_width: f32,
    pub slot_role_width: f32,
    pub slot_height: f32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            slot_width: 150.0,
            slot_role_width: 80.0,
            slot_height: 44.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FoundationConfig {
    pub slot_width: f32,
    pub slot_role_width: f32,
    pub slot_height: f32,
}

impl Default for FoundationConfig {
    fn default() -> Self {
        Self {
            slot_width: 150.0,
            slot_role_width: 80.0,
            slot_height: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MartConfig {
    pub slot_width: f32,
    pub slot_role_width: f32,
    pub slot_height: f32,
}

impl Default for MartConfig {
    fn default() -> Self {
        Self {
            slot_width: 150.0,
            slot_role_width: 120.0,
            slot_height: 44.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
    pub iterations: usize,
    pub charge: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub collide_padding: f32,
    pub center_strength: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            charge: -120.0,
            link_distance: 60.0,
            link_strength: 0.3,
            collide_padding: 10.0,
            center_strength: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayeredConfig {
    pub rank_gap: f32,
    pub node_gap: f32,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            rank_gap: 40.0,
            node_gap: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub container_margin: Margins,
    pub node_spacing: Spacing,
    pub header: HeaderConfig,
    pub text: TextConfig,
    pub leaf: LeafConfig,
    pub adapter: AdapterConfig,
    pub foundation: FoundationConfig,
    pub mart: MartConfig,
    /// Width/height ratio for containers sized with `use_root_ratio`.
    pub root_ratio: f32,
    pub force: ForceConfig,
    pub layered: LayeredConfig,
    pub status_cascade: bool,
    pub collapse_on_status: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_margin: Margins::uniform(8.0),
            node_spacing: Spacing::default(),
            header: HeaderConfig::default(),
            text: TextConfig::default(),
            leaf: LeafConfig::default(),
            adapter: AdapterConfig::default(),
            foundation: FoundationConfig::default(),
            mart: MartConfig::default(),
            root_ratio: 16.0 / 9.0,
            force: ForceConfig::default(),
            layered: LayeredConfig::default(),
            status_cascade: true,
            collapse_on_status: false,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.container_margin.is_valid() {
            return Err(LayoutError::InvalidConfig(
                "container margins must be non-negative".to_string(),
            ));
        }
        let spacing = self.node_spacing;
        if spacing.horizontal < 0.0 || spacing.vertical < 0.0 {
            return Err(LayoutError::InvalidConfig(
                "node spacing must be non-negative".to_string(),
            ));
        }
        if self.text.font_size <= 0.0 || self.text.line_height <= 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "font size {} / line height {} must be positive",
                self.text.font_size, self.text.line_height
            )));
        }
        if let Some(max_width) = self.header.max_width
            && max_width < self.header.min_width
        {
            return Err(LayoutError::InvalidConfig(format!(
                "header maxWidth {max_width} is below minWidth {}",
                self.header.min_width
            )));
        }
        if self.root_ratio <= 0.0 {
            return Err(LayoutError::InvalidConfig(
                "rootRatio must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial settings as they appear in a config file or a diagram document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub container_margin: Option<MarginsFile>,
    pub node_spacing: Option<Spacing>,
    pub header: Option<HeaderConfig>,
    pub text: Option<TextConfig>,
    pub leaf: Option<LeafConfig>,
    pub adapter: Option<AdapterConfig>,
    pub foundation: Option<FoundationConfig>,
    pub mart: Option<MartConfig>,
    pub root_ratio: Option<f32>,
    pub force: Option<ForceConfig>,
    pub layered: Option<LayeredConfig>,
    pub status_cascade: Option<bool>,
    pub collapse_on_status: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MarginsFile {
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
}

impl MarginsFile {
    pub fn over(self, base: Margins) -> Margins {
        Margins {
            top: self.top.unwrap_or(base.top),
            right: self.right.unwrap_or(base.right),
            bottom: self.bottom.unwrap_or(base.bottom),
            left: self.left.unwrap_or(base.left),
        }
    }
}

impl ConfigFile {
    /// Merge these overrides over `config`.
    pub fn apply(self, mut config: LayoutConfig) -> LayoutConfig {
        if let Some(margins) = self.container_margin {
            config.container_margin = margins.over(config.container_margin);
        }
        if let Some(v) = self.node_spacing {
            config.node_spacing = v;
        }
        if let Some(v) = self.header {
            config.header = v;
        }
        if let Some(v) = self.text {
            config.text = v;
        }
        if let Some(v) = self.leaf {
            config.leaf = v;
        }
        if let Some(v) = self.adapter {
            config.adapter = v;
        }
        if let Some(v) = self.foundation {
            config.foundation = v;
        }
        if let Some(v) = self.mart {
            config.mart = v;
        }
        if let Some(v) = self.root_ratio {
            config.root_ratio = v;
        }
        if let Some(v) = self.force {
            config.force = v;
        }
        if let Some(v) = self.layered {
            config.layered = v;
        }
        if let Some(v) = self.status_cascade {
            config.status_cascade = v;
        }
        if let Some(v) = self.collapse_on_status {
            config.collapse_on_status = v;
        }
        config
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let config = LayoutConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    let config = parsed.apply(config);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.container_margin, Margins::uniform(8.0));
        assert_eq!(config.node_spacing.horizontal, 20.0);
        assert_eq!(config.node_spacing.vertical, 10.0);
    }

    #[test]
    fn partial_sections_merge_over_defaults() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"containerMargin": {"left": 2}, "nodeSpacing": {"vertical": 4}, "statusCascade": false}"#,
        )
        .unwrap();
        let config = file.apply(LayoutConfig::default());
        assert_eq!(config.container_margin.left, 2.0);
        assert_eq!(config.container_margin.top, 8.0);
        assert_eq!(config.node_spacing.vertical, 4.0);
        assert_eq!(config.node_spacing.horizontal, 20.0);
        assert!(!config.status_cascade);
    }

    #[test]
    fn rejects_negative_spacing() {
        let mut config = LayoutConfig::default();
        config.node_spacing.vertical = -1.0;
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_negative_margins() {
        let mut config = LayoutConfig::default();
        config.container_margin.bottom = -3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_header_bounds() {
        let mut config = LayoutConfig::default();
        config.header.max_width = Some(20.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_without_path_returns_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, LayoutConfig::default());
    }
}

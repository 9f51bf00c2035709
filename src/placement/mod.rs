//! External placement sources for Delegated (Group) containers.
//!
//! Providers are one-shot: they take the children and the links between
//! them and hand back final center positions synchronously. They never see
//! the tree.

mod force;
mod layered;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::diagram::NodeId;
use crate::geometry::{Point, Size};

pub use force::ForcePlacement;
pub use layered::LayeredPlacement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementNode {
    pub id: NodeId,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlacementLink {
    pub source: NodeId,
    pub target: NodeId,
}

pub trait PlacementProvider {
    /// Center positions for `nodes`, in any frame; callers normalize the
    /// bounding box. Nodes missing from the result keep their old position.
    fn compute_positions(
        &mut self,
        nodes: &[PlacementNode],
        links: &[PlacementLink],
    ) -> BTreeMap<NodeId, Point>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    #[default]
    Force,
    Layered,
}

impl PlacementKind {
    pub fn parse(value: &str) -> Option<PlacementKind> {
        match value.trim().to_ascii_lowercase().as_str() {
            "force" | "simulation" => Some(PlacementKind::Force),
            "layered" | "dag" | "dagre" => Some(PlacementKind::Layered),
            _ => None,
        }
    }
}

/// The provider registered for each placement kind.
pub struct Providers {
    force: Box<dyn PlacementProvider>,
    layered: Box<dyn PlacementProvider>,
}

impl Providers {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            force: Box::new(ForcePlacement::new(config.force.clone())),
            layered: Box::new(LayeredPlacement::new(config.layered.clone())),
        }
    }

    pub fn set(&mut self, kind: PlacementKind, provider: Box<dyn PlacementProvider>) {
        match kind {
            PlacementKind::Force => self.force = provider,
            PlacementKind::Layered => self.layered = provider,
        }
    }

    pub fn get_mut(&mut self, kind: PlacementKind) -> &mut dyn PlacementProvider {
        match kind {
            PlacementKind::Force => self.force.as_mut(),
            PlacementKind::Layered => self.layered.as_mut(),
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

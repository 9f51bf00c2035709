use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::diagram::NodeId;
use crate::error::LayoutWarning;
use crate::geometry::Point;
use crate::placement::{PlacementKind, PlacementLink, PlacementNode, Providers};

use super::{ContainerRef, SlotRole};

/// Transient state for one layout pass.
///
/// Strategies read settings from it, ask it for external placements and
/// report recoverable degradations through it. Nothing in here outlives the
/// pass, so nodes stay plain data.
pub struct LayoutContext<'a> {
    pub config: &'a LayoutConfig,
    providers: &'a mut Providers,
    links: &'a BTreeMap<NodeId, Vec<PlacementLink>>,
    placements: HashMap<NodeId, BTreeMap<NodeId, Point>>,
    warnings: Vec<LayoutWarning>,
    provider_calls: usize,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        config: &'a LayoutConfig,
        providers: &'a mut Providers,
        links: &'a BTreeMap<NodeId, Vec<PlacementLink>>,
    ) -> Self {
        Self {
            config,
            providers,
            links,
            placements: HashMap::new(),
            warnings: Vec::new(),
            provider_calls: 0,
        }
    }

    /// Positions from the container's placement provider. The provider runs
    /// at most once per container per pass.
    pub(crate) fn delegated_positions(
        &mut self,
        container: NodeId,
        kind: PlacementKind,
        nodes: &[PlacementNode],
    ) -> &BTreeMap<NodeId, Point> {
        if !self.placements.contains_key(&container) {
            let links: Vec<PlacementLink> = self
                .links
                .get(&container)
                .map(|links| {
                    links
                        .iter()
                        .filter(|link| {
                            nodes.iter().any(|n| n.id == link.source)
                                && nodes.iter().any(|n| n.id == link.target)
                        })
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            let positions = self.providers.get_mut(kind).compute_positions(nodes, &links);
            self.provider_calls += 1;
            tracing::trace!(
                container = container.index(),
                ?kind,
                nodes = nodes.len(),
                links = links.len(),
                "placement provider ran"
            );
            self.placements.insert(container, positions);
        }
        &self.placements[&container]
    }

    pub(crate) fn missing_slot(&mut self, container: ContainerRef<'_>, role: SlotRole) {
        self.warn(LayoutWarning::MissingSlotData {
            container: container.key.to_string(),
            slot: role.as_str().to_string(),
        });
    }

    /// Collected per pass; the diagram logs each distinct warning once.
    pub(crate) fn warn(&mut self, warning: LayoutWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn take_warnings(&mut self) -> Vec<LayoutWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls
    }
}

//! Arrangement strategies.
//!
//! A strategy turns a container's layout-active children into a [`Plan`]:
//! the size the children need (`required_size`) and where each child sits
//! inside that block. [`ArrangementKind::arrange`] then centers the block in
//! the container's inner-content zone and reports offsets relative to the
//! zone's top-left corner.

mod adapter;
mod columns;
mod context;
mod delegated;
mod foundation;
mod lane;
mod mart;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagram::NodeId;
use crate::geometry::{Point, Rect, Size};
use crate::placement::PlacementKind;

pub use adapter::{AdapterArrangement, AdapterMode, AdapterParams, infer_adapter_role};
pub use context::LayoutContext;
pub use foundation::{FoundationParams, Orientation, infer_foundation_role};
pub use mart::{MartParams, infer_mart_role};

/// Named slot a child fills in an Adapter, Foundation or Mart container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Staging,
    Archive,
    Transform,
    Raw,
    Base,
    Load,
    Report,
}

impl SlotRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotRole::Staging => "staging",
            SlotRole::Archive => "archive",
            SlotRole::Transform => "transform",
            SlotRole::Raw => "raw",
            SlotRole::Base => "base",
            SlotRole::Load => "load",
            SlotRole::Report => "report",
        }
    }

    /// Display name used for auto-created slot labels.
    pub fn title(self) -> &'static str {
        match self {
            SlotRole::Staging => "Staging",
            SlotRole::Archive => "Archive",
            SlotRole::Transform => "Transform",
            SlotRole::Raw => "Raw",
            SlotRole::Base => "Base",
            SlotRole::Load => "Load",
            SlotRole::Report => "Report",
        }
    }

    pub fn parse(value: &str) -> Option<SlotRole> {
        match value.trim().to_ascii_lowercase().as_str() {
            "staging" => Some(SlotRole::Staging),
            "archive" => Some(SlotRole::Archive),
            "transform" => Some(SlotRole::Transform),
            "raw" => Some(SlotRole::Raw),
            "base" => Some(SlotRole::Base),
            "load" => Some(SlotRole::Load),
            "report" => Some(SlotRole::Report),
            _ => None,
        }
    }
}

/// Strategy selector plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrangementKind {
    Lane,
    Columns,
    Adapter(AdapterParams),
    Foundation(FoundationParams),
    Mart(MartParams),
    Delegated(PlacementKind),
}

impl ArrangementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArrangementKind::Lane => "lane",
            ArrangementKind::Columns => "columns",
            ArrangementKind::Adapter(_) => "adapter",
            ArrangementKind::Foundation(_) => "foundation",
            ArrangementKind::Mart(_) => "mart",
            ArrangementKind::Delegated(_) => "delegated",
        }
    }

    pub fn plan(
        &self,
        container: ContainerRef<'_>,
        children: &[ChildBox],
        ctx: &mut LayoutContext<'_>,
    ) -> Plan {
        if children.is_empty() {
            return Plan::default();
        }
        let spacing = ctx.config.node_spacing;
        match self {
            ArrangementKind::Lane => lane::plan(children, spacing.vertical),
            ArrangementKind::Columns => columns::plan(children, spacing.horizontal),
            ArrangementKind::Adapter(params) => adapter::plan(container, children, params, ctx),
            ArrangementKind::Foundation(params) => {
                foundation::plan(container, children, params, ctx)
            }
            ArrangementKind::Mart(params) => mart::plan(container, children, params, ctx),
            ArrangementKind::Delegated(kind) => delegated::plan(container, children, *kind, ctx),
        }
    }

    /// Size of the inner-content zone the children need.
    pub fn required_size(
        &self,
        container: ContainerRef<'_>,
        children: &[ChildBox],
        ctx: &mut LayoutContext<'_>,
    ) -> Size {
        self.plan(container, children, ctx).size
    }

    /// Child placements relative to the top-left corner of `inner`.
    pub fn arrange(
        &self,
        container: ContainerRef<'_>,
        children: &[ChildBox],
        inner: Rect,
        ctx: &mut LayoutContext<'_>,
    ) -> Arrangement {
        let plan = self.plan(container, children, ctx);
        let shift = Point::new(
            ((inner.width - plan.size.width) / 2.0).max(0.0),
            ((inner.height - plan.size.height) / 2.0).max(0.0),
        );
        plan.slots
            .into_iter()
            .map(|slot| {
                (
                    slot.id,
                    Placement {
                        offset: slot.offset + shift,
                        size: slot.size,
                    },
                )
            })
            .collect()
    }
}

/// The container a strategy is running for.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRef<'a> {
    pub id: NodeId,
    pub key: &'a str,
}

impl<'a> ContainerRef<'a> {
    pub fn new(id: NodeId, key: &'a str) -> Self {
        Self { id, key }
    }
}

/// What a strategy sees of one child.
#[derive(Debug, Clone)]
pub struct ChildBox {
    pub id: NodeId,
    pub size: Size,
    /// Current center in the container's local frame.
    pub position: Point,
    pub role: Option<SlotRole>,
}

impl ChildBox {
    pub fn new(id: NodeId, size: Size) -> Self {
        Self {
            id,
            size,
            position: Point::ORIGIN,
            role: None,
        }
    }

    pub fn with_role(mut self, role: SlotRole) -> Self {
        self.role = Some(role);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub id: NodeId,
    /// Top-left corner inside the plan's block.
    pub offset: Point,
    /// Size the child takes; differs from its natural size when derived
    /// from siblings.
    pub size: Size,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub slots: Vec<Slot>,
    pub size: Size,
}

impl Plan {
    /// Build a plan whose block is the bounding box of the slots, anchored
    /// at the origin.
    pub(crate) fn from_slots(slots: Vec<Slot>) -> Plan {
        let size = slots.iter().fold(Size::ZERO, |acc, slot| {
            Size::new(
                acc.width.max(slot.offset.x + slot.size.width),
                acc.height.max(slot.offset.y + slot.size.height),
            )
        });
        Plan { slots, size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub offset: Point,
    pub size: Size,
}

pub type Arrangement = BTreeMap<NodeId, Placement>;

/// Children that fill no named slot go in a row under the slot block.
pub(crate) fn place_extras(
    slots: &mut Vec<Slot>,
    extras: &[&ChildBox],
    spacing_h: f32,
    spacing_v: f32,
) {
    if extras.is_empty() {
        return;
    }
    let top = slots
        .iter()
        .map(|slot| slot.offset.y + slot.size.height + spacing_v)
        .fold(0.0f32, f32::max);
    let mut x = 0.0;
    for child in extras {
        slots.push(Slot {
            id: child.id,
            offset: Point::new(x, top),
            size: child.size,
        });
        x += child.size.width + spacing_h;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::placement::Providers;

    pub(crate) fn container() -> ContainerRef<'static> {
        ContainerRef::new(NodeId::from_index(0), "box")
    }

    pub(crate) fn child(index: usize, width: f32, height: f32) -> ChildBox {
        ChildBox::new(NodeId::from_index(index), Size::new(width, height))
    }

    #[test]
    fn arrange_centers_block_in_wider_zone() {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let links = BTreeMap::new();
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);
        let children = vec![child(1, 40.0, 40.0), child(2, 60.0, 40.0)];
        let inner = Rect::new(-50.0, -45.0, 100.0, 90.0);
        let out = ArrangementKind::Lane.arrange(container(), &children, inner, &mut ctx);
        let first = out[&NodeId::from_index(1)];
        let second = out[&NodeId::from_index(2)];
        assert_eq!(first.offset, Point::new(30.0, 0.0));
        assert_eq!(second.offset, Point::new(20.0, 50.0));
    }

    #[test]
    fn empty_children_need_no_space() {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let links = BTreeMap::new();
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);
        let size = ArrangementKind::Columns.required_size(container(), &[], &mut ctx);
        assert_eq!(size, Size::ZERO);
    }

    #[test]
    fn slot_roles_parse_case_insensitively() {
        assert_eq!(SlotRole::parse(" Staging"), Some(SlotRole::Staging));
        assert_eq!(SlotRole::parse("BASE"), Some(SlotRole::Base));
        assert_eq!(SlotRole::parse("lake"), None);
    }
}

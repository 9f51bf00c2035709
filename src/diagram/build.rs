//! Turning `NodeSpec`s into tree nodes.

use std::collections::BTreeSet;

use crate::arrange::{
    AdapterArrangement, AdapterMode, AdapterParams, ArrangementKind, FoundationParams,
    MartParams, Orientation, SlotRole, infer_adapter_role, infer_foundation_role,
    infer_mart_role,
};
use crate::error::{LayoutError, LayoutWarning, Result};
use crate::geometry::{MinimumSizeRequest, Point, Size, compute_minimum_size};
use crate::ir::NodeSpec;
use crate::placement::PlacementKind;

use super::types::{
    CollapseState, ContainerData, DisplayMode, LeafSizing, Node, NodeBody, NodeId, NodeVariant,
    Status,
};
use super::Diagram;

/// Kind given to the edges containers draw between their own slots.
pub const INTERNAL_EDGE_KIND: &str = "internal";

/// What a child needs to know about the container it is being built into.
struct ParentInfo {
    id: NodeId,
    key: String,
    label: String,
    variant: NodeVariant,
    display_mode: DisplayMode,
}

impl Diagram {
    /// Insert `spec` and its subtree under `parent`. Adapter, Foundation and
    /// Mart containers are pushed onto `slotted` so their internal edges can be
    /// wired once the whole subtree exists.
    pub(crate) fn insert_spec(
        &mut self,
        parent: Option<NodeId>,
        spec: &NodeSpec,
        slotted: &mut Vec<NodeId>,
    ) -> Result<NodeId> {
        let parent_info = parent.and_then(|id| self.parent_info(id));
        let variant = self.resolve_variant(spec);
        let label = spec.label_or_id().to_string();

        let role = spec.role.as_deref().and_then(SlotRole::parse).or_else(|| {
            match parent_info.as_ref().map(|info| info.variant) {
                Some(NodeVariant::Adapter) => {
                    infer_adapter_role(spec.category.as_deref(), &label)
                }
                Some(NodeVariant::Foundation) => {
                    infer_foundation_role(spec.category.as_deref(), &label)
                }
                Some(NodeVariant::Mart) => infer_mart_role(spec.category.as_deref(), &label),
                _ => None,
            }
        });
        let caption = match (&parent_info, role) {
            (Some(info), Some(role)) if info.display_mode == DisplayMode::Role => {
                Some(role.as_str().to_string())
            }
            _ => None,
        };
        let display = caption.clone().unwrap_or_else(|| label.clone());

        let body = if variant.is_container() {
            NodeBody::Container(self.container_data(spec, variant, &display)?)
        } else {
            let slot = role.and_then(|role| {
                parent_info
                    .as_ref()
                    .and_then(|info| self.slot_size(info, role))
            });
            self.leaf_body(spec, variant, &display, slot)
        };
        let size = match &body {
            NodeBody::Leaf { intrinsic, .. } => *intrinsic,
            NodeBody::Container(data) => data.minimum_size,
        };
        let status = match spec.status.as_deref() {
            Some(value) => Status::parse(value).unwrap_or_else(|| {
                tracing::warn!(node = %spec.id, %value, "unknown status; treating as unknown");
                Status::Unknown
            }),
            None => Status::default(),
        };

        let id = self.tree.insert(Node {
            key: spec.id.clone(),
            label,
            caption,
            variant,
            parent: parent_info.as_ref().map(|info| info.id),
            position: Point::ORIGIN,
            size,
            body,
            role,
            category: spec.category.clone(),
            status,
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
        })?;

        for child in &spec.children {
            self.insert_spec(Some(id), child, slotted)?;
        }
        if matches!(
            variant,
            NodeVariant::Adapter | NodeVariant::Foundation | NodeVariant::Mart
        ) {
            self.create_missing_slots(id, spec)?;
            slotted.push(id);
        }
        Ok(id)
    }

    fn parent_info(&self, id: NodeId) -> Option<ParentInfo> {
        let node = self.tree.get(id)?;
        let data = node.container()?;
        Some(ParentInfo {
            id,
            key: node.key.clone(),
            label: node.label.clone(),
            variant: node.variant,
            display_mode: data.display_mode,
        })
    }

    fn resolve_variant(&mut self, spec: &NodeSpec) -> NodeVariant {
        let fallback = if spec.children.is_empty() {
            NodeVariant::Rectangle
        } else {
            NodeVariant::Group
        };
        let Some(kind) = spec.kind.as_deref() else {
            return fallback;
        };
        match NodeVariant::parse(kind) {
            Some(variant) if variant.is_container() || spec.children.is_empty() => variant,
            _ => {
                self.record_warning(LayoutWarning::UnknownArrangementMode {
                    container: spec.id.clone(),
                    value: kind.to_string(),
                    fallback: fallback.as_str().to_string(),
                });
                fallback
            }
        }
    }

    /// Fall back to `default` and record the unrecognised `value`.
    fn fallback<T>(&mut self, spec: &NodeSpec, value: &str, default: T, name: &str) -> T {
        self.record_warning(LayoutWarning::UnknownArrangementMode {
            container: spec.id.clone(),
            value: value.to_string(),
            fallback: name.to_string(),
        });
        default
    }

    fn arrangement_for(&mut self, spec: &NodeSpec, variant: NodeVariant) -> ArrangementKind {
        let layout = &spec.layout;
        match variant {
            NodeVariant::Lane => ArrangementKind::Lane,
            NodeVariant::Columns => ArrangementKind::Columns,
            NodeVariant::Adapter => {
                let mode = match layout.mode.as_deref() {
                    None => AdapterMode::Full,
                    Some(value) => match AdapterMode::parse(value) {
                        Some(mode) => mode,
                        None => self.fallback(spec, value, AdapterMode::Full, "full"),
                    },
                };
                let arrangement = match layout.arrangement {
                    None => AdapterArrangement::TransformBelow,
                    Some(number) => match AdapterArrangement::from_number(number) {
                        Some(arrangement) => arrangement,
                        None => self.fallback(
                            spec,
                            &number.to_string(),
                            AdapterArrangement::TransformBelow,
                            "1",
                        ),
                    },
                };
                ArrangementKind::Adapter(AdapterParams::new(mode, arrangement))
            }
            NodeVariant::Foundation => ArrangementKind::Foundation(FoundationParams {
                orientation: self.orientation(spec),
            }),
            NodeVariant::Mart => ArrangementKind::Mart(MartParams {
                orientation: self.orientation(spec),
            }),
            NodeVariant::Group | NodeVariant::Rectangle | NodeVariant::Circle => {
                let placement = match layout.placement.as_deref() {
                    None => PlacementKind::default(),
                    Some(value) => match PlacementKind::parse(value) {
                        Some(kind) => kind,
                        None => self.fallback(spec, value, PlacementKind::Force, "force"),
                    },
                };
                ArrangementKind::Delegated(placement)
            }
        }
    }

    fn orientation(&mut self, spec: &NodeSpec) -> Orientation {
        match spec.layout.orientation.as_deref() {
            None => Orientation::default(),
            Some(value) => match Orientation::parse(value) {
                Some(orientation) => orientation,
                None => self.fallback(spec, value, Orientation::Horizontal, "horizontal"),
            },
        }
    }

    fn container_data(
        &mut self,
        spec: &NodeSpec,
        variant: NodeVariant,
        display: &str,
    ) -> Result<ContainerData> {
        let default_mode = match variant {
            NodeVariant::Foundation | NodeVariant::Mart => DisplayMode::Role,
            _ => DisplayMode::Full,
        };
        let display_mode = match spec.layout.display_mode.as_deref() {
            None => default_mode,
            Some(value) => match DisplayMode::parse(value) {
                Some(mode) => mode,
                None => self.fallback(spec, value, default_mode, default_mode.as_str()),
            },
        };
        let arrangement = self.arrangement_for(spec, variant);
        let margins = spec
            .layout
            .margins
            .map_or(self.config.container_margin, |m| {
                m.over(self.config.container_margin)
            });
        if !margins.is_valid() {
            return Err(LayoutError::InvalidConfig(format!(
                "margins of {} must be non-negative",
                spec.id
            )));
        }
        let minimum = compute_minimum_size(
            &MinimumSizeRequest {
                label: display,
                margins,
                header_height: spec.layout.header_height,
                floor: spec.layout.minimum_size,
                use_root_ratio: spec.layout.use_root_ratio,
            },
            self.measurer.as_ref(),
            &self.config,
        );
        let state = if spec.collapsed {
            CollapseState::Collapsed
        } else {
            CollapseState::Expanded
        };
        Ok(ContainerData {
            arrangement,
            margins,
            header_height: minimum.header_height,
            header_override: spec.layout.header_height,
            minimum_size: minimum.size,
            minimum_floor: spec.layout.minimum_size,
            use_root_ratio: spec.layout.use_root_ratio,
            display_mode,
            expanded_size_cache: None,
            children: Vec::new(),
            state,
            materialized: !spec.collapsed,
            content_dirty: false,
        })
    }

    /// Default box for a slot child of an Adapter, Foundation or Mart.
    fn slot_size(&self, parent: &ParentInfo, role: SlotRole) -> Option<Size> {
        let role_mode = parent.display_mode == DisplayMode::Role;
        let (width, role_width, height) = match (parent.variant, role) {
            (NodeVariant::Adapter, SlotRole::Staging | SlotRole::Archive | SlotRole::Transform) => {
                let c = &self.config.adapter;
                (c.slot_width, c.slot_role_width, c.slot_height)
            }
            (NodeVariant::Foundation, SlotRole::Raw | SlotRole::Base) => {
                let c = &self.config.foundation;
                (c.slot_width, c.slot_role_width, c.slot_height)
            }
            (NodeVariant::Mart, SlotRole::Load | SlotRole::Report) => {
                let c = &self.config.mart;
                (c.slot_width, c.slot_role_width, c.slot_height)
            }
            _ => return None,
        };
        Some(Size::new(if role_mode { role_width } else { width }, height))
    }

    fn leaf_body(
        &mut self,
        spec: &NodeSpec,
        variant: NodeVariant,
        display: &str,
        slot: Option<Size>,
    ) -> NodeBody {
        let leaf = &self.config.leaf;
        if variant == NodeVariant::Circle {
            let diameter = 2.0 * spec.radius.unwrap_or(leaf.circle_radius);
            return NodeBody::Leaf {
                intrinsic: Size::new(diameter, diameter),
                sizing: LeafSizing::Circle,
            };
        }
        let requested = Size::new(
            spec.width
                .or(slot.map(|s| s.width))
                .unwrap_or(leaf.default_width),
            spec.height
                .or(slot.map(|s| s.height))
                .unwrap_or(leaf.default_height),
        );
        let sizing = match spec.layout.sizing.as_deref() {
            None if slot.is_some() => LeafSizing::Fixed,
            None => LeafSizing::Default {
                base_width: requested.width,
            },
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "default" => LeafSizing::Default {
                    base_width: requested.width,
                },
                "auto-size" | "auto" => LeafSizing::AutoSize,
                "fixed-size" | "fixed" => LeafSizing::Fixed,
                _ => self.fallback(
                    spec,
                    value,
                    LeafSizing::Default {
                        base_width: requested.width,
                    },
                    "default",
                ),
            },
        };
        NodeBody::Leaf {
            intrinsic: self.measure_leaf(sizing, requested, display),
            sizing,
        }
    }

    /// Leaf size for `label` under `sizing`; heights never follow the label.
    pub(crate) fn measure_leaf(&self, sizing: LeafSizing, current: Size, label: &str) -> Size {
        let leaf = &self.config.leaf;
        let text = self.measurer.measure_label(label).width + leaf.label_padding;
        match sizing {
            LeafSizing::Default { base_width } => Size::new(base_width.max(text), current.height),
            LeafSizing::AutoSize => Size::new(text.max(leaf.auto_min_width), current.height),
            LeafSizing::Fixed | LeafSizing::Circle => current,
        }
    }

    /// Adapters always get every slot their mode shows; Foundations and Marts
    /// only in `auto` mode.
    fn create_missing_slots(&mut self, container: NodeId, spec: &NodeSpec) -> Result<()> {
        let Some(info) = self.parent_info(container) else {
            return Ok(());
        };
        let auto = matches!(info.variant, NodeVariant::Foundation | NodeVariant::Mart)
            && self.auto_slots(spec);
        let required: Vec<SlotRole> = match self.tree.get(container).and_then(Node::container) {
            Some(ContainerData {
                arrangement: ArrangementKind::Adapter(params),
                ..
            }) => params.mode.required_roles().to_vec(),
            Some(ContainerData {
                arrangement: ArrangementKind::Foundation(_),
                ..
            }) if auto => vec![SlotRole::Raw, SlotRole::Base],
            Some(ContainerData {
                arrangement: ArrangementKind::Mart(_),
                ..
            }) if auto => vec![SlotRole::Load, SlotRole::Report],
            _ => Vec::new(),
        };
        let present: BTreeSet<SlotRole> = self
            .tree
            .children(container)
            .iter()
            .filter_map(|child| self.tree.get(*child)?.role)
            .collect();

        for role in required.into_iter().filter(|role| !present.contains(role)) {
            let Some(size) = self.slot_size(&info, role) else {
                continue;
            };
            let caption = (info.display_mode == DisplayMode::Role).then(|| role.as_str().to_string());
            let key = format!("{}_{}", role.as_str(), info.key);
            tracing::debug!(container = %info.key, slot = %key, "creating missing slot");
            self.tree.insert(Node {
                key,
                label: format!("{} {}", role.title(), info.label),
                caption,
                variant: NodeVariant::Rectangle,
                parent: Some(container),
                position: Point::ORIGIN,
                size,
                body: NodeBody::Leaf {
                    intrinsic: size,
                    sizing: LeafSizing::Fixed,
                },
                role: Some(role),
                category: None,
                status: Status::default(),
                incoming: BTreeSet::new(),
                outgoing: BTreeSet::new(),
            })?;
        }
        Ok(())
    }

    fn auto_slots(&mut self, spec: &NodeSpec) -> bool {
        match spec.layout.mode.as_deref() {
            None => true,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "auto" => true,
                "manual" => false,
                _ => self.fallback(spec, value, true, "auto"),
            },
        }
    }

    /// Connect the slots of each container in `containers` the way its
    /// variant always draws them.
    pub(crate) fn wire_internal_edges(&mut self, containers: &[NodeId]) -> Result<()> {
        for container in containers {
            let links: Vec<(SlotRole, SlotRole)> =
                match self.tree.get(*container).and_then(Node::container) {
                    Some(data) => match &data.arrangement {
                        ArrangementKind::Adapter(params) => params.mode.internal_links().to_vec(),
                        ArrangementKind::Foundation(_) => vec![(SlotRole::Raw, SlotRole::Base)],
                        ArrangementKind::Mart(_) => vec![(SlotRole::Load, SlotRole::Report)],
                        _ => Vec::new(),
                    },
                    None => Vec::new(),
                };
            for (from, to) in links {
                let source = self.slot_child(*container, from);
                let target = self.slot_child(*container, to);
                if let (Some(source), Some(target)) = (source, target) {
                    self.insert_edge(source, target, INTERNAL_EDGE_KIND)?;
                }
            }
        }
        Ok(())
    }

    fn slot_child(&self, container: NodeId, role: SlotRole) -> Option<NodeId> {
        self.tree
            .children(container)
            .iter()
            .copied()
            .find(|child| self.tree.get(*child).and_then(|n| n.role) == Some(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, MarginsFile};
    use crate::diagram::Diagram;
    use crate::measure::{FixedMeasurer, LabelMeasurer};
    use rstest::rstest;

    fn measurer() -> Box<dyn LabelMeasurer> {
        Box::new(FixedMeasurer::new(8.0, 16.0))
    }

    fn build(spec: NodeSpec) -> Diagram {
        Diagram::with_measurer(&spec, LayoutConfig::default(), measurer()).unwrap()
    }

    fn leaf_in_lane(leaf: NodeSpec) -> Size {
        let diagram = build(NodeSpec::new("lane", "lane").with_children(vec![leaf]));
        let id = diagram.find("leaf").unwrap();
        diagram.node(id).unwrap().size()
    }

    #[rstest]
    // 17 chars * 8 + 20 padding = 156 beats the 150 default
    #[case::default_grows(None, None, "a very long label", Size::new(156.0, 20.0))]
    #[case::default_keeps_base(None, None, "short", Size::new(150.0, 20.0))]
    #[case::auto_floor(Some("auto-size"), None, "ab", Size::new(60.0, 20.0))]
    #[case::auto_fits(Some("auto-size"), None, "abcdefghij", Size::new(100.0, 20.0))]
    #[case::fixed_default(Some("fixed-size"), None, "a very long label", Size::new(150.0, 20.0))]
    #[case::fixed_given(Some("fixed-size"), Some(70.0), "a very long label", Size::new(70.0, 20.0))]
    fn leaf_sizing_modes(
        #[case] sizing: Option<&str>,
        #[case] width: Option<f32>,
        #[case] label: &str,
        #[case] expected: Size,
    ) {
        let mut leaf = NodeSpec::new("leaf", "rect").with_label(label);
        leaf.width = width;
        leaf.layout.sizing = sizing.map(str::to_string);
        assert_eq!(leaf_in_lane(leaf), expected);
    }

    #[test]
    fn circles_use_their_radius() {
        let mut leaf = NodeSpec::new("leaf", "circle");
        assert_eq!(leaf_in_lane(leaf.clone()), Size::new(20.0, 20.0));
        leaf.radius = Some(15.0);
        assert_eq!(leaf_in_lane(leaf), Size::new(30.0, 30.0));
    }

    #[test]
    fn unknown_types_fall_back_with_a_warning() {
        let diagram = build(NodeSpec::new("outer", "swimlane").with_children(vec![
            NodeSpec::new("inner", "hexagon"),
        ]));
        let outer = diagram.node(diagram.root()).unwrap();
        assert_eq!(outer.variant(), NodeVariant::Group);
        let inner = diagram.node(diagram.find("inner").unwrap()).unwrap();
        assert_eq!(inner.variant(), NodeVariant::Rectangle);
        assert_eq!(
            diagram.warnings(),
            &[
                LayoutWarning::UnknownArrangementMode {
                    container: "outer".to_string(),
                    value: "swimlane".to_string(),
                    fallback: "group".to_string(),
                },
                LayoutWarning::UnknownArrangementMode {
                    container: "inner".to_string(),
                    value: "hexagon".to_string(),
                    fallback: "rect".to_string(),
                },
            ]
        );
    }

    #[test]
    fn adapters_create_missing_slots_and_internal_edges() {
        let diagram = build(
            NodeSpec::new("orders", "adapter")
                .with_label("Orders")
                .with_children(vec![NodeSpec::new("stg_orders", "rect")]),
        );
        let adapter = diagram.root();
        let children = diagram.children(adapter).unwrap();
        assert_eq!(children.len(), 3);

        let staging = diagram.find("stg_orders").unwrap();
        assert_eq!(diagram.node(staging).unwrap().role(), Some(SlotRole::Staging));
        assert_eq!(diagram.node(staging).unwrap().size(), Size::new(150.0, 44.0));

        let archive = diagram.find("archive_orders").unwrap();
        let node = diagram.node(archive).unwrap();
        assert_eq!(node.label(), "Archive Orders");
        assert_eq!(node.role(), Some(SlotRole::Archive));
        assert!(diagram.find("transform_orders").is_some());

        let keys: Vec<&str> = diagram.edges().map(|(_, edge)| edge.key()).collect();
        assert_eq!(
            keys,
            vec![
                "stg_orders--internal--transform_orders",
                "stg_orders--internal--archive_orders",
            ]
        );
    }

    #[test]
    fn archive_only_adapters_get_one_slot() {
        let mut spec = NodeSpec::new("orders", "adapter");
        spec.layout.mode = Some("archive_only".to_string());
        let diagram = build(spec);
        assert_eq!(diagram.children(diagram.root()).unwrap().len(), 1);
        assert_eq!(diagram.edges().count(), 0);
    }

    #[test]
    fn foundations_default_to_role_labels() {
        let diagram = build(NodeSpec::new("customers", "foundation").with_label("Customers"));
        let raw = diagram.find("raw_customers").unwrap();
        let node = diagram.node(raw).unwrap();
        assert_eq!(node.display_label(), "raw");
        assert_eq!(node.label(), "Raw Customers");
        assert_eq!(node.size(), Size::new(80.0, 20.0));
        let (_, edge) = diagram.edges().next().unwrap();
        assert_eq!(edge.kind(), INTERNAL_EDGE_KIND);
        assert_eq!(edge.target(), diagram.find("base_customers").unwrap());
    }

    #[test]
    fn manual_foundations_keep_their_children() {
        let mut spec = NodeSpec::new("customers", "foundation");
        spec.layout.mode = Some("manual".to_string());
        let diagram = build(spec);
        assert!(diagram.children(diagram.root()).unwrap().is_empty());
    }

    #[test]
    fn bad_layout_values_fall_back() {
        let mut spec = NodeSpec::new("orders", "adapter");
        spec.layout.mode = Some("everything".to_string());
        spec.layout.arrangement = Some(9);
        let diagram = build(spec);
        let data = diagram.node(diagram.root()).unwrap().container().unwrap();
        assert_eq!(
            data.arrangement(),
            &ArrangementKind::Adapter(AdapterParams::default())
        );
        assert_eq!(diagram.warnings().len(), 2);
    }

    #[test]
    fn collapsed_containers_start_unmaterialized() {
        let diagram = build(
            NodeSpec::new("lane", "lane")
                .with_children(vec![NodeSpec::leaf("a", 10.0, 10.0)])
                .collapsed(),
        );
        let data = diagram.node(diagram.root()).unwrap().container().unwrap();
        assert!(!data.is_materialized());
        assert_eq!(data.state(), CollapseState::Collapsed);
        assert_eq!(diagram.node(diagram.root()).unwrap().size(), data.minimum_size());
    }

    #[test]
    fn negative_node_margins_are_rejected() {
        let mut inner = NodeSpec::new("inner", "lane");
        inner.layout.margins = Some(MarginsFile {
            left: Some(-4.0),
            ..MarginsFile::default()
        });
        let spec = NodeSpec::new("outer", "lane").with_children(vec![inner]);
        let result = Diagram::with_measurer(&spec, LayoutConfig::default(), measurer());
        assert!(matches!(
            result,
            Err(LayoutError::InvalidConfig(message)) if message.contains("inner")
        ));
    }

    #[test]
    fn marts_infer_roles_and_fill_the_gap() {
        let diagram = build(
            NodeSpec::new("sales", "mart")
                .with_label("Sales")
                .with_children(vec![NodeSpec::new("sales_rprt", "rect")]),
        );
        let report = diagram.find("sales_rprt").unwrap();
        let node = diagram.node(report).unwrap();
        assert_eq!(node.role(), Some(SlotRole::Report));
        assert_eq!(node.display_label(), "report");
        assert_eq!(node.size(), Size::new(120.0, 44.0));

        let load = diagram.find("load_sales").unwrap();
        assert_eq!(diagram.node(load).unwrap().label(), "Load Sales");
        let (_, edge) = diagram.edges().next().unwrap();
        assert_eq!(edge.kind(), INTERNAL_EDGE_KIND);
        assert_eq!(edge.source(), load);
        assert_eq!(edge.target(), report);
        assert_eq!(
            diagram.node(diagram.root()).unwrap().container().unwrap().arrangement(),
            &ArrangementKind::Mart(MartParams::default())
        );
    }

    #[test]
    fn full_mode_marts_use_the_wide_slot() {
        let mut spec = NodeSpec::new("sales", "mart").with_label("Sales");
        spec.layout.display_mode = Some("full".to_string());
        spec.layout.orientation = Some("rotate270".to_string());
        let diagram = build(spec);
        let load = diagram.find("load_sales").unwrap();
        let report = diagram.find("report_sales").unwrap();
        assert_eq!(diagram.node(load).unwrap().size(), Size::new(150.0, 44.0));
        assert_eq!(diagram.node(load).unwrap().display_label(), "Load Sales");
        assert!(diagram.node(report).unwrap().position().y < diagram.node(load).unwrap().position().y);
    }
}

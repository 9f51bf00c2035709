use std::collections::BTreeSet;

use serde::Serialize;

use crate::arrange::{ArrangementKind, SlotRole};
use crate::geometry::{Margins, Point, Rect, Size};

/// Arena index of a node. Stable for the node's lifetime; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(usize);

impl EdgeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeVariant {
    Rectangle,
    Circle,
    Lane,
    Columns,
    Adapter,
    Foundation,
    Mart,
    Group,
}

impl NodeVariant {
    pub fn parse(value: &str) -> Option<NodeVariant> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" | "node" => Some(NodeVariant::Rectangle),
            "circle" => Some(NodeVariant::Circle),
            "lane" => Some(NodeVariant::Lane),
            "columns" => Some(NodeVariant::Columns),
            "adapter" => Some(NodeVariant::Adapter),
            "foundation" => Some(NodeVariant::Foundation),
            "mart" => Some(NodeVariant::Mart),
            "group" => Some(NodeVariant::Group),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeVariant::Rectangle => "rect",
            NodeVariant::Circle => "circle",
            NodeVariant::Lane => "lane",
            NodeVariant::Columns => "columns",
            NodeVariant::Adapter => "adapter",
            NodeVariant::Foundation => "foundation",
            NodeVariant::Mart => "mart",
            NodeVariant::Group => "group",
        }
    }

    pub fn is_container(self) -> bool {
        !matches!(self, NodeVariant::Rectangle | NodeVariant::Circle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CollapseState {
    #[default]
    Expanded,
    Collapsed,
}

/// How slot children of an Adapter, Foundation or Mart label themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Full,
    Role,
}

impl DisplayMode {
    pub fn parse(value: &str) -> Option<DisplayMode> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Some(DisplayMode::Full),
            "role" => Some(DisplayMode::Role),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Full => "full",
            DisplayMode::Role => "role",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    #[default]
    Undetermined,
    Unknown,
    Disabled,
    Ready,
    Updating,
    Updated,
    Skipped,
    Delayed,
    Warning,
    Error,
}

impl Status {
    pub fn parse(value: &str) -> Option<Status> {
        match value.trim().to_ascii_lowercase().as_str() {
            "undetermined" => Some(Status::Undetermined),
            "unknown" => Some(Status::Unknown),
            "disabled" => Some(Status::Disabled),
            "ready" => Some(Status::Ready),
            "updating" => Some(Status::Updating),
            "updated" => Some(Status::Updated),
            "skipped" => Some(Status::Skipped),
            "delayed" => Some(Status::Delayed),
            "warning" => Some(Status::Warning),
            "error" => Some(Status::Error),
            _ => None,
        }
    }

    /// Rank used when folding leaf statuses into a container; higher wins.
    /// Statuses that never surface through aggregation rank `None`.
    pub fn aggregation_rank(self) -> Option<u8> {
        match self {
            Status::Ready => Some(0),
            Status::Skipped => Some(1),
            Status::Updated => Some(2),
            Status::Updating => Some(3),
            Status::Unknown => Some(4),
            Status::Delayed => Some(5),
            Status::Warning => Some(6),
            Status::Error => Some(7),
            Status::Undetermined | Status::Disabled => None,
        }
    }

    /// Statuses that mean "nothing to look at here".
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            Status::Ready | Status::Disabled | Status::Updated | Status::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EdgeStatus {
    Ready,
    Active,
    Warning,
    Error,
    Disabled,
    #[default]
    Unknown,
}

impl EdgeStatus {
    pub fn parse(value: &str) -> Option<EdgeStatus> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ready" => Some(EdgeStatus::Ready),
            "active" => Some(EdgeStatus::Active),
            "warning" => Some(EdgeStatus::Warning),
            "error" => Some(EdgeStatus::Error),
            "disabled" => Some(EdgeStatus::Disabled),
            "unknown" => Some(EdgeStatus::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContainerData {
    pub(crate) arrangement: ArrangementKind,
    pub(crate) margins: Margins,
    pub(crate) header_height: f32,
    pub(crate) header_override: Option<f32>,
    pub(crate) minimum_size: Size,
    pub(crate) minimum_floor: Option<Size>,
    pub(crate) use_root_ratio: bool,
    pub(crate) display_mode: DisplayMode,
    pub(crate) expanded_size_cache: Option<Size>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) state: CollapseState,
    pub(crate) materialized: bool,
    /// Set when the subtree changed while collapsed, so the cached expanded
    /// size can no longer be trusted.
    pub(crate) content_dirty: bool,
}

impl ContainerData {
    pub fn arrangement(&self) -> &ArrangementKind {
        &self.arrangement
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn minimum_size(&self) -> Size {
        self.minimum_size
    }

    pub fn expanded_size_cache(&self) -> Option<Size> {
        self.expanded_size_cache
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn state(&self) -> CollapseState {
        self.state
    }

    pub fn is_collapsed(&self) -> bool {
        self.state == CollapseState::Collapsed
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }
}

/// How a leaf derives its size from its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafSizing {
    /// Requested width, grown to fit the label.
    Default { base_width: f32 },
    /// Label width plus padding, with a floor.
    AutoSize,
    /// Exactly the requested size.
    Fixed,
    Circle,
}

#[derive(Debug, Clone)]
pub enum NodeBody {
    /// Leaf with its own (content-derived) size.
    Leaf { intrinsic: Size, sizing: LeafSizing },
    Container(ContainerData),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) key: String,
    pub(crate) label: String,
    /// Compact label shown instead of `label` in role display mode.
    pub(crate) caption: Option<String>,
    pub(crate) variant: NodeVariant,
    pub(crate) parent: Option<NodeId>,
    /// Center in the parent's local frame.
    pub(crate) position: Point,
    pub(crate) size: Size,
    pub(crate) body: NodeBody,
    pub(crate) role: Option<SlotRole>,
    pub(crate) category: Option<String>,
    pub(crate) status: Status,
    pub(crate) incoming: BTreeSet<EdgeId>,
    pub(crate) outgoing: BTreeSet<EdgeId>,
}

impl Node {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn display_label(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.label)
    }

    pub fn variant(&self) -> NodeVariant {
        self.variant
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Bounding rectangle in the parent's frame.
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    pub fn role(&self) -> Option<SlotRole> {
        self.role
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn container(&self) -> Option<&ContainerData> {
        match &self.body {
            NodeBody::Container(data) => Some(data),
            NodeBody::Leaf { .. } => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.body {
            NodeBody::Container(data) => Some(data),
            NodeBody::Leaf { .. } => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.container().is_some()
    }

    pub fn is_collapsed(&self) -> bool {
        self.container().is_some_and(ContainerData::is_collapsed)
    }

    /// Leaves are never collapsed.
    pub fn collapse_state(&self) -> CollapseState {
        self.container()
            .map_or(CollapseState::Expanded, ContainerData::state)
    }

    pub fn children(&self) -> &[NodeId] {
        self.container().map_or(&[], ContainerData::children)
    }

    pub fn incoming(&self) -> &BTreeSet<EdgeId> {
        &self.incoming
    }

    pub fn outgoing(&self) -> &BTreeSet<EdgeId> {
        &self.outgoing
    }
}

/// Render-time placement of an edge in its joint container's frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeRoute {
    /// Sum of the positions of the source chain containers.
    pub source_offset: Point,
    pub target_offset: Point,
    /// Node the edge visibly attaches to: the endpoint, or the outermost
    /// collapsed container of its chain.
    pub source_anchor: NodeId,
    pub target_anchor: NodeId,
    /// Anchor centers in the joint's frame.
    pub source_point: Point,
    pub target_point: Point,
    /// False while the joint (or one of its ancestors) is collapsed.
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) key: String,
    pub(crate) kind: String,
    pub(crate) label: String,
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    pub(crate) joint: NodeId,
    pub(crate) source_chain: Vec<NodeId>,
    pub(crate) target_chain: Vec<NodeId>,
    pub(crate) status: EdgeStatus,
    pub(crate) route: EdgeRoute,
}

impl Edge {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn joint(&self) -> NodeId {
        self.joint
    }

    pub fn source_chain(&self) -> &[NodeId] {
        &self.source_chain
    }

    pub fn target_chain(&self) -> &[NodeId] {
        &self.target_chain
    }

    pub fn status(&self) -> EdgeStatus {
        self.status
    }

    pub fn route(&self) -> &EdgeRoute {
        &self.route
    }
}

//! The containment tree and its mutation API.
//!
//! Every mutation runs to completion before returning: the affected sizes
//! cascade up to the highest changed container, that branch is re-arranged
//! top-down, and only then are edge routes recomputed and the renderer told
//! which rectangles moved.

mod build;
mod cascade;
mod collapse;
mod edges;
mod renderer;
mod status;
mod tree;
mod types;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::arrange::{ArrangementKind, LayoutContext};
use crate::config::LayoutConfig;
use crate::error::{EdgeResolutionFailure, LayoutError, LayoutWarning, Result};
use crate::geometry::{
    MinimumSizeRequest, Size, Zones, apply_zones, compute_minimum_size,
};
use crate::ir::{DiagramDocument, NodeSpec};
use crate::measure::{LabelMeasurer, default_measurer};
use crate::placement::{PlacementKind, PlacementLink, PlacementProvider, Providers};

pub use renderer::{NullRenderer, SceneRenderer};
pub use types::{
    CollapseState, ContainerData, DisplayMode, Edge, EdgeId, EdgeRoute, EdgeStatus, LeafSizing,
    Node, NodeBody, NodeId, NodeVariant, Status,
};

use tree::Tree;

/// Edge type used when a document edge names none.
pub const DEFAULT_EDGE_KIND: &str = "link";

pub struct Diagram {
    tree: Tree,
    root: NodeId,
    edges: Vec<Option<Edge>>,
    edge_keys: HashMap<String, EdgeId>,
    config: LayoutConfig,
    measurer: Box<dyn LabelMeasurer>,
    providers: Providers,
    renderer: Box<dyn SceneRenderer>,
    warnings: Vec<LayoutWarning>,
}

impl Diagram {
    /// Build and lay out the tree under `root`, measuring labels with the
    /// measurer for `config.text`.
    pub fn new(root: &NodeSpec, config: LayoutConfig) -> Result<Self> {
        let measurer = default_measurer(&config.text);
        Self::with_measurer(root, config, measurer)
    }

    pub fn with_measurer(
        root: &NodeSpec,
        config: LayoutConfig,
        measurer: Box<dyn LabelMeasurer>,
    ) -> Result<Self> {
        let mut diagram = Self::build(root, config, measurer)?;
        diagram.relayout();
        Ok(diagram)
    }

    /// Build a diagram from a loaded document. Document settings override
    /// `config`; several top-level nodes share a synthetic `root` group.
    pub fn from_document(
        doc: &DiagramDocument,
        config: LayoutConfig,
        measurer: Box<dyn LabelMeasurer>,
    ) -> Result<Self> {
        let config = match &doc.settings {
            Some(settings) => settings.clone().apply(config),
            None => config,
        };
        let root = match doc.nodes.as_slice() {
            [single] => single.clone(),
            nodes => NodeSpec::new("root", "group").with_children(nodes.to_vec()),
        };
        let mut diagram = Self::build(&root, config, measurer)?;
        for spec in &doc.edges {
            let source = diagram.lookup_endpoint(&spec.source)?;
            let target = diagram.lookup_endpoint(&spec.target)?;
            let kind = spec.kind.as_deref().unwrap_or(DEFAULT_EDGE_KIND);
            let (id, _) = diagram.insert_edge(source, target, kind)?;
            if let Some(status) = spec.status.as_deref().and_then(EdgeStatus::parse)
                && let Some(edge) = diagram.edge_slot_mut(id)
            {
                edge.status = status;
            }
        }
        diagram.relayout();
        Ok(diagram)
    }

    fn build(
        root: &NodeSpec,
        config: LayoutConfig,
        measurer: Box<dyn LabelMeasurer>,
    ) -> Result<Self> {
        config.validate()?;
        let providers = Providers::from_config(&config);
        let mut diagram = Diagram {
            tree: Tree::default(),
            root: NodeId::from_index(0),
            edges: Vec::new(),
            edge_keys: HashMap::new(),
            config,
            measurer,
            providers,
            renderer: Box::new(NullRenderer),
            warnings: Vec::new(),
        };
        let mut slotted = Vec::new();
        diagram.root = diagram.insert_spec(None, root, &mut slotted)?;
        diagram.wire_internal_edges(&slotted)?;
        if diagram.config.status_cascade {
            diagram.aggregate_all_statuses();
        }
        tracing::debug!(
            nodes = diagram.tree.live_count(),
            edges = diagram.edges().count(),
            "diagram built"
        );
        Ok(diagram)
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn SceneRenderer>) {
        self.renderer = renderer;
    }

    /// Replace the provider behind `kind` and lay everything out again.
    pub fn set_placement_provider(
        &mut self,
        kind: PlacementKind,
        provider: Box<dyn PlacementProvider>,
    ) {
        self.providers.set(kind, provider);
        self.relayout();
    }

    /// Size every node bottom-up and arrange the whole tree.
    pub fn relayout(&mut self) {
        let root = self.root;
        let touched = self.run_layout(|tree, ctx, touched| {
            tree.size_subtree(root, ctx, touched);
            tree.arrange_subtree(root, ctx, touched);
        });
        self.finish_pass(&touched, true);
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.tree.node(id)
    }

    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.tree.find(key)
    }

    /// Every live node, parents before children.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.tree.preorder()
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.tree.node(id)?.children())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.tree.node(id)?.parent)
    }

    /// Parent first, root last.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let chain = self
            .tree
            .ancestors(id)
            .ok_or_else(|| LayoutError::UnknownNode {
                id: self.tree.key(id),
            })?;
        Ok(chain.into_iter().skip(1).collect())
    }

    /// Header, margin and inner-content rectangles of a container, in its
    /// own local frame.
    pub fn zones(&self, id: NodeId) -> Result<Zones> {
        let node = self.tree.node(id)?;
        let data = node.container().ok_or_else(|| LayoutError::NotAContainer {
            id: node.key.clone(),
        })?;
        Ok(apply_zones(node.size, &data.margins, data.header_height))
    }

    /// Recoverable degradations seen so far, each reported once.
    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Add `spec` (and its subtree) as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId> {
        let parent_node = self.tree.node(parent)?;
        if !parent_node.is_container() {
            return Err(LayoutError::NotAContainer {
                id: parent_node.key.clone(),
            });
        }
        let mut slotted = Vec::new();
        let id = self.insert_spec(Some(parent), spec, &mut slotted)?;
        self.wire_internal_edges(&slotted)?;
        if self.config.status_cascade {
            for node in self.tree.subtree(id).into_iter().rev() {
                self.aggregate_status(node);
            }
            self.propagate_status(parent);
        }
        let touched = self.run_layout(|tree, ctx, touched| {
            tree.size_subtree(id, ctx, touched);
            tree.content_changed(parent, ctx, touched);
        });
        self.finish_pass(&touched, false);
        Ok(id)
    }

    /// Destroy `id`, its subtree and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(LayoutError::RootRemoval);
        }
        let parent = self
            .tree
            .node(id)?
            .parent
            .ok_or(LayoutError::RootRemoval)?;
        let doomed: BTreeSet<NodeId> = self.tree.subtree(id).into_iter().collect();
        let dead_edges: Vec<EdgeId> = self
            .edges()
            .filter(|(_, edge)| doomed.contains(&edge.source) || doomed.contains(&edge.target))
            .map(|(edge_id, _)| edge_id)
            .collect();
        for edge_id in dead_edges {
            self.detach_edge(edge_id)?;
        }
        let removed = self.tree.remove_subtree(id);
        tracing::debug!(node = %self.tree.key(parent), removed = removed.len(), "subtree removed");
        self.renderer.dematerialize(id);

        if self.config.status_cascade {
            self.propagate_status(parent);
        }
        let touched = self.run_layout(|tree, ctx, touched| {
            tree.content_changed(parent, ctx, touched);
        });
        self.finish_pass(&touched, false);
        Ok(())
    }

    /// A leaf takes `size` as its new fixed size; a container takes it as
    /// its new minimum-size floor.
    pub fn resize(&mut self, id: NodeId, size: Size) -> Result<()> {
        let node = self.tree.node_mut(id)?;
        match &mut node.body {
            NodeBody::Leaf { intrinsic, sizing } => {
                *intrinsic = size;
                *sizing = LeafSizing::Fixed;
            }
            NodeBody::Container(data) => data.minimum_floor = Some(size),
        }
        self.refresh_minimum_size(id)?;
        let touched = self.run_layout(|tree, ctx, touched| tree.cascade_from(id, ctx, touched));
        self.finish_pass(&touched, false);
        Ok(())
    }

    /// Change the label; leaf sizes and container minimums follow it.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        let node = self.tree.node_mut(id)?;
        node.label = label;
        let display = node.display_label().to_string();
        if let NodeBody::Leaf { intrinsic, sizing } = node.body {
            let measured = self.measure_leaf(sizing, intrinsic, &display);
            if let NodeBody::Leaf { intrinsic, .. } = &mut self.tree.node_mut(id)?.body {
                *intrinsic = measured;
            }
        }
        self.refresh_minimum_size(id)?;
        let touched = self.run_layout(|tree, ctx, touched| tree.cascade_from(id, ctx, touched));
        self.finish_pass(&touched, false);
        Ok(())
    }

    /// Recompute a container's minimum size from its label, margins and
    /// floor. Leaves are left alone.
    fn refresh_minimum_size(&mut self, id: NodeId) -> Result<()> {
        let node = self.tree.node(id)?;
        let Some(data) = node.container() else {
            return Ok(());
        };
        let minimum = compute_minimum_size(
            &MinimumSizeRequest {
                label: node.display_label(),
                margins: data.margins,
                header_height: data.header_override,
                floor: data.minimum_floor,
                use_root_ratio: data.use_root_ratio,
            },
            self.measurer.as_ref(),
            &self.config,
        );
        if let Some(data) = self.tree.node_mut(id)?.container_mut() {
            // A collapsed container's cached expanded size assumed the old
            // header and floor.
            if data.is_collapsed()
                && (!data.minimum_size.approx_eq(minimum.size)
                    || data.header_height != minimum.header_height)
            {
                data.content_dirty = true;
            }
            data.minimum_size = minimum.size;
            data.header_height = minimum.header_height;
        }
        Ok(())
    }

    fn lookup_endpoint(&self, key: &str) -> Result<NodeId> {
        self.tree.find(key).ok_or_else(|| {
            EdgeResolutionFailure::UnknownEndpoint {
                id: key.to_string(),
            }
            .into()
        })
    }

    /// Run one layout pass over the tree with a fresh context. Returns the
    /// nodes whose geometry changed.
    fn run_layout(
        &mut self,
        pass: impl FnOnce(&mut Tree, &mut LayoutContext<'_>, &mut BTreeSet<NodeId>),
    ) -> BTreeSet<NodeId> {
        let links = self.group_links();
        let mut touched = BTreeSet::new();
        let mut ctx = LayoutContext::new(&self.config, &mut self.providers, &links);
        pass(&mut self.tree, &mut ctx, &mut touched);
        let warnings = ctx.take_warnings();
        for warning in warnings {
            self.record_warning(warning);
        }
        touched
    }

    /// Edges are always recomputed after geometry, then the renderer hears
    /// about every rectangle that moved.
    fn finish_pass(&mut self, touched: &BTreeSet<NodeId>, all_edges: bool) {
        self.refresh_routes((!all_edges).then_some(touched));
        for id in touched {
            if let Some(node) = self.tree.get(*id) {
                self.renderer.geometry_changed(*id, node.rect());
            }
        }
    }

    pub(crate) fn record_warning(&mut self, warning: LayoutWarning) {
        if self.warnings.contains(&warning) {
            return;
        }
        warning.emit();
        self.warnings.push(warning);
    }

    /// Links each Delegated container hands its placement provider: every
    /// edge jointed there, mapped onto the two direct children holding its
    /// endpoints.
    fn group_links(&self) -> BTreeMap<NodeId, Vec<PlacementLink>> {
        let mut links: BTreeMap<NodeId, Vec<PlacementLink>> = BTreeMap::new();
        for (_, edge) in self.edges() {
            let delegated = self
                .tree
                .get(edge.joint)
                .and_then(Node::container)
                .is_some_and(|data| matches!(data.arrangement, ArrangementKind::Delegated(_)));
            if !delegated || edge.source == edge.joint || edge.target == edge.joint {
                continue;
            }
            let source = edge.source_chain.last().copied().unwrap_or(edge.source);
            let target = edge.target_chain.last().copied().unwrap_or(edge.target);
            if source == target {
                continue;
            }
            let link = PlacementLink { source, target };
            let entry = links.entry(edge.joint).or_default();
            if !entry.contains(&link) {
                entry.push(link);
            }
        }
        links
    }
}

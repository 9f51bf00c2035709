use crate::geometry::Rect;

use super::types::{CollapseState, NodeId};

/// The drawing side of the engine. It owns visual primitives and applies
/// the geometry the engine computes; it never computes geometry itself.
///
/// Every hook defaults to a no-op, so a renderer only implements what it
/// cares about.
pub trait SceneRenderer {
    /// First expansion of a container that was loaded collapsed: create
    /// visuals for `children`.
    fn materialize_children(&mut self, _container: NodeId, _children: &[NodeId]) {}

    /// `container` and its subtree are gone; free their visuals.
    fn dematerialize(&mut self, _container: NodeId) {}

    fn collapse_changed(&mut self, _container: NodeId, _state: CollapseState) {}

    /// Called after a cascade for every node whose rectangle (in its
    /// parent's frame) moved or resized.
    fn geometry_changed(&mut self, _node: NodeId, _rect: Rect) {}
}

/// Renderer that ignores everything; used when running headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl SceneRenderer for NullRenderer {}

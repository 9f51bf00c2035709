pub mod arrange;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout_dump;
pub mod measure;
pub mod placement;
#[cfg(feature = "fonts")]
pub mod text_metrics;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, load_config};
pub use diagram::{
    CollapseState, Diagram, EdgeId, EdgeRoute, EdgeStatus, NodeId, NodeVariant, NullRenderer,
    SceneRenderer, Status,
};
pub use error::{EdgeResolutionFailure, LayoutError, LayoutWarning, Result};
pub use geometry::{Margins, Point, Rect, Size, Zones};
pub use ir::{DiagramDocument, EdgeSpec, NodeSpec};
pub use measure::{FixedMeasurer, LabelMeasurer, LabelMetrics};
pub use placement::{PlacementKind, PlacementProvider};

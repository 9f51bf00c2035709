use thiserror::Error;

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("edge rejected: {0}")]
    EdgeResolution(#[from] EdgeResolutionFailure),
    #[error("cannot expand {node}: {reason}")]
    InvalidCollapseTransition { node: String, reason: String },
    #[error("unknown node `{id}`")]
    UnknownNode { id: String },
    #[error("unknown edge #{id}")]
    UnknownEdge { id: usize },
    #[error("duplicate node id `{id}`")]
    DuplicateNodeId { id: String },
    #[error("`{id}` is not a container")]
    NotAContainer { id: String },
    #[error("the root container cannot be removed")]
    RootRemoval,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EdgeResolutionFailure {
    #[error("self-loop on `{node}` is not supported")]
    SelfLoop { node: String },
    #[error("`{node}` is not reachable from the root")]
    Unreachable { node: String },
    #[error("unknown endpoint `{id}`")]
    UnknownEndpoint { id: String },
}

/// Degradations the engine recovers from. They never interrupt a layout
/// pass; the diagram keeps them for inspection and logs each one.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    /// A slot the active mode needs is absent; formulas that reference it
    /// are skipped.
    MissingSlotData { container: String, slot: String },
    /// An unrecognised mode or sub-arrangement; a documented default is used
    /// instead.
    UnknownArrangementMode {
        container: String,
        value: String,
        fallback: String,
    },
}

impl LayoutWarning {
    pub(crate) fn emit(&self) {
        match self {
            LayoutWarning::MissingSlotData { container, slot } => {
                tracing::warn!(%container, %slot, "slot missing; skipping formulas that use it");
            }
            LayoutWarning::UnknownArrangementMode {
                container,
                value,
                fallback,
            } => {
                tracing::warn!(%container, %value, %fallback, "unrecognised layout value; using fallback");
            }
        }
    }
}

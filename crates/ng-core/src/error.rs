//! Error taxonomy shared by every crate in the workspace.
//!
//! Construction-time errors (`MissingDependency`, `IncompleteConfiguration`,
//! `InvalidConfiguration`) abort initialization. Batch errors reject the whole
//! batch; the registry is left exactly as it was before the call.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A required collaborator (scene, camera, canvas) was not supplied.
    #[error("missing required dependency: {0}")]
    MissingDependency(&'static str),

    /// An edge names a source or target node that does not exist.
    #[error("edge {edge} references missing node {node}")]
    DanglingReference { edge: EdgeId, node: NodeId },

    /// Required configuration fields are absent.
    #[error("incomplete configuration, missing: {}", .missing.join(", "))]
    IncompleteConfiguration { missing: Vec<String> },

    /// A configuration field is present but unusable.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeId),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
}

pub type Result<T> = std::result::Result<T, GraphError>;

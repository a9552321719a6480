pub mod config;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod registry;
pub mod scene;

pub use config::{EntityKinds, GraphConfig};
pub use error::{GraphError, Result};
pub use geometry::{ArrowHead, CurveEdgeGeometry, EdgeGeometry, NodeVisual, StraightEdgeGeometry};
pub use id::{EdgeId, NodeId};
pub use model::*;
pub use registry::{EndpointRole, EntityRegistry, IncidentEdge, OwnerLookup};
pub use scene::{Primitive, PrimitiveId, PrimitiveLayer, Scene, Shape};

// Re-export glam so downstream crates agree on the math types
pub use glam;

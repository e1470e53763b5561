//! Similarity graph engine: data model, connection index, tooltip
//! aggregation, force layout, interaction and render mapping.

pub mod aggregate;
pub mod index;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod types;

pub use aggregate::{ConnectionSummary, ReasonGroup, summarize_edge, summarize_node};
pub use index::{ConnectionIndex, DropReason, DroppedEdge, KeptEdge, NodeConnection};
pub use interaction::{GraphEvent, InteractionController, PointerInput, ViewTransform};
pub use layout::{LayoutConfig, LayoutEngine, RunState, SimNode, TickReport};
pub use render::{Scene, SceneFocus, build_scene, resolve_connection_type};
pub use types::{
    ConnectionReason, ConnectionType, GraphData, GraphEdge, GraphFingerprint, GraphNode,
    MediaType, ReasonKind,
};

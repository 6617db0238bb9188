//! Network topology module.
//!
//! Graph types, the single-pass builder that turns profile parameters into
//! a request graph, and the consistency checks the graph must pass before
//! it is rendered.

pub mod types;
pub mod builder;
pub mod validate;

// Re-export key types and functions for easier access
pub use types::{
    Interface, InterfaceOwner, Node, NodeKind, NodeRole, Segment, SegmentKind, StorageEndpoint,
    StorageVolume, Topology, TopologySummary, TransportFlags,
};
pub use builder::build_topology;
pub use validate::validate_topology;

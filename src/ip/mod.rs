//! IP address allocation and management module.
//!
//! Extra segments use a fixed addressing scheme: segment `j` is
//! `192.168.j.0/24` and the node with ordinal `i` is host `i + 1`. The
//! provisioning scripts on the nodes hardcode this scheme.

pub mod registry;
pub mod allocator;

// Re-export commonly used types
pub use registry::AddressRegistry;
pub use allocator::{segment_address, AddressAssignment};

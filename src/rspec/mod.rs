//! # Request Rendering Module
//!
//! Turns a validated [`Topology`](crate::topology::Topology) into the
//! document submitted to the allocation backend.
//!
//! ## Formats
//!
//! - **rspec**: GENI RSpec v3 request with the Emulab extension namespace.
//!   This is what the portal accepts.
//! - **yaml** / **json**: the graph itself, serialized with serde, for
//!   inspection and for tooling that post-processes the topology.
//!
//! ## Example RSpec Fragment
//!
//! ```xml
//! <node client_id="node1" exclusive="true">
//!   <sliver_type name="raw-pc">
//!     <disk_image name="urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU18-64-STD"/>
//!   </sliver_type>
//!   <interface client_id="node1:if1">
//!     <ip address="192.168.0.2" netmask="255.255.255.0" type="ipv4"/>
//!   </interface>
//! </node>
//! ```
//!
//! Rendering never mutates or repairs the graph. Anything the renderer
//! cannot express is reported as an external service error.

pub mod writer;
pub mod format;

pub use format::{render, OutputFormat};
pub use writer::render_rspec;

//! Topology graph types.
//!
//! The graph is an arena: nodes, storage endpoints, interfaces, segments
//! and volumes live in vectors on [`Topology`] and refer to each other by
//! index. Ids are only handed out by the `add_*` methods, so an id is
//! always a valid index into the topology that produced it.

use serde::Serialize;

use crate::config::Placement;
use crate::ip::AddressAssignment;
use crate::process::ExecuteService;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(/// Index of a node in [`Topology::nodes`]
    NodeId);
arena_id!(/// Index of a storage endpoint in [`Topology::endpoints`]
    EndpointId);
arena_id!(/// Index of an interface in [`Topology::interfaces`]
    InterfaceId);
arena_id!(/// Index of a segment in [`Topology::segments`]
    SegmentId);
arena_id!(/// Index of a volume in [`Topology::volumes`]
    VolumeId);

/// Physical or virtual allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    RawPc,
    XenVm,
}

impl NodeKind {
    pub fn from_virtual(use_virtual_machines: bool) -> Self {
        if use_virtual_machines {
            NodeKind::XenVm
        } else {
            NodeKind::RawPc
        }
    }

    /// Sliver type name in the request
    pub fn sliver_type(&self) -> &'static str {
        match self {
            NodeKind::RawPc => "raw-pc",
            NodeKind::XenVm => "emulab-xen",
        }
    }

    /// Physical nodes are allocated exclusively
    pub fn is_exclusive(&self) -> bool {
        matches!(self, NodeKind::RawPc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Rendezvous node holding every dataset
    Server,
    Node,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub ordinal: u32,
    pub name: String,
    pub disk_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_type: Option<String>,
    pub kind: NodeKind,
    pub role: NodeRole,
    pub interfaces: Vec<InterfaceId>,
    pub volumes: Vec<VolumeId>,
    pub services: Vec<ExecuteService>,
}

/// Remote blockstore placeholder at the far end of a dataset link
#[derive(Debug, Clone, Serialize)]
pub struct StorageEndpoint {
    pub id: EndpointId,
    pub name: String,
    pub interface: InterfaceId,
    pub volume: VolumeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum InterfaceOwner {
    Node(NodeId),
    Endpoint(EndpointId),
}

#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub id: InterfaceId,
    /// `<owner>:if<n>`
    pub client_id: String,
    pub owner: InterfaceOwner,
    pub segment: SegmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressAssignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Point-to-point, exactly two members
    Link,
    /// Broadcast segment, two or more members
    Lan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransportFlags {
    pub best_effort: bool,
    pub vlan_tagging: bool,
    pub link_multiplexing: bool,
}

impl TransportFlags {
    /// Flags the shared LAN and dataset links must carry
    pub fn shared() -> Self {
        TransportFlags {
            best_effort: true,
            vlan_tagging: true,
            link_multiplexing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,
    pub kind: SegmentKind,
    pub members: Vec<InterfaceId>,
    pub flags: TransportFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "class")]
pub enum StorageVolume {
    /// Local storage owned by one node; `size_gb == 0` means all available
    Ephemeral {
        owner: NodeId,
        name: String,
        size_gb: u32,
        mount_point: String,
        placement: Placement,
    },
    /// Persistent dataset, shared by reference
    Dataset {
        dataset: String,
        mount_point: String,
        read_only: bool,
        writable_clone: bool,
    },
}

impl StorageVolume {
    pub fn mount_point(&self) -> &str {
        match self {
            StorageVolume::Ephemeral { mount_point, .. } | StorageVolume::Dataset { mount_point, .. } => {
                mount_point
            }
        }
    }
}

/// Complete request graph produced by one build
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub nodes: Vec<Node>,
    pub endpoints: Vec<StorageEndpoint>,
    pub interfaces: Vec<Interface>,
    pub segments: Vec<Segment>,
    pub volumes: Vec<StorageVolume>,
}

/// Counts used in logs and the CLI summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopologySummary {
    pub nodes: usize,
    pub lans: usize,
    pub links: usize,
    pub addressed_interfaces: usize,
    pub dataset_links: usize,
    pub volumes: usize,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.id = id;
        self.nodes.push(node);
        id
    }

    pub fn add_segment(&mut self, name: String, kind: SegmentKind, flags: TransportFlags) -> SegmentId {
        let id = SegmentId(self.segments.len());
        self.segments.push(Segment {
            id,
            name,
            kind,
            members: Vec::new(),
            flags,
        });
        id
    }

    pub fn add_volume(&mut self, volume: StorageVolume) -> VolumeId {
        let id = VolumeId(self.volumes.len());
        self.volumes.push(volume);
        id
    }

    /// Create an interface on `node` and make it a member of `segment`
    pub fn attach_node(
        &mut self,
        node: NodeId,
        segment: SegmentId,
        address: Option<AddressAssignment>,
    ) -> InterfaceId {
        let id = InterfaceId(self.interfaces.len());
        let owner = &mut self.nodes[node.index()];
        let client_id = format!("{}:if{}", owner.name, owner.interfaces.len());
        owner.interfaces.push(id);
        self.push_interface(id, client_id, InterfaceOwner::Node(node), segment, address)
    }

    /// Create a storage endpoint bound to `volume` and join it to `segment`
    pub fn add_endpoint(&mut self, name: String, volume: VolumeId, segment: SegmentId) -> EndpointId {
        let id = EndpointId(self.endpoints.len());
        let interface = InterfaceId(self.interfaces.len());
        let client_id = format!("{}:if0", name);
        self.endpoints.push(StorageEndpoint {
            id,
            name,
            interface,
            volume,
        });
        self.push_interface(interface, client_id, InterfaceOwner::Endpoint(id), segment, None);
        id
    }

    fn push_interface(
        &mut self,
        id: InterfaceId,
        client_id: String,
        owner: InterfaceOwner,
        segment: SegmentId,
        address: Option<AddressAssignment>,
    ) -> InterfaceId {
        self.interfaces.push(Interface {
            id,
            client_id,
            owner,
            segment,
            address,
        });
        self.segments[segment.index()].members.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn interface(&self, id: InterfaceId) -> &Interface {
        &self.interfaces[id.index()]
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.index()]
    }

    pub fn volume(&self, id: VolumeId) -> &StorageVolume {
        &self.volumes[id.index()]
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn segment_by_name(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.name == name)
    }

    /// Name of whatever owns `interface`
    pub fn owner_name(&self, interface: &Interface) -> &str {
        match interface.owner {
            InterfaceOwner::Node(node) => &self.nodes[node.index()].name,
            InterfaceOwner::Endpoint(endpoint) => &self.endpoints[endpoint.index()].name,
        }
    }

    /// Segments that connect a node to a storage endpoint
    pub fn dataset_links(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |segment| {
            segment
                .members
                .iter()
                .any(|member| matches!(self.interface(*member).owner, InterfaceOwner::Endpoint(_)))
        })
    }

    /// Interfaces carrying a static address
    pub fn addressed_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|interface| interface.address.is_some())
    }

    /// Dataset identifier reached through `segment`, if it is a dataset link
    pub fn dataset_of_link(&self, segment: &Segment) -> Option<&str> {
        segment.members.iter().find_map(|member| match self.interface(*member).owner {
            InterfaceOwner::Endpoint(endpoint) => match self.volume(self.endpoints[endpoint.index()].volume) {
                StorageVolume::Dataset { dataset, .. } => Some(dataset.as_str()),
                StorageVolume::Ephemeral { .. } => None,
            },
            InterfaceOwner::Node(_) => None,
        })
    }

    pub fn summary(&self) -> TopologySummary {
        let dataset_links = self.dataset_links().count();
        TopologySummary {
            nodes: self.nodes.len(),
            lans: self.segments.iter().filter(|s| s.kind == SegmentKind::Lan).count(),
            links: self.segments.iter().filter(|s| s.kind == SegmentKind::Link).count(),
            addressed_interfaces: self.addressed_interfaces().count(),
            dataset_links,
            volumes: self.volumes.len(),
        }
    }
}

impl std::fmt::Display for TopologySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} LANs, {} links ({} to datasets), {} addressed interfaces, {} volumes",
            self.nodes, self.lans, self.links, self.dataset_links, self.addressed_interfaces, self.volumes
        )
    }
}

//! Topology builder.
//!
//! One pass over a validated [`ProfileConfig`]:
//!
//! 1. pre-create the extra segments (a `Link` for exactly two nodes, a
//!    `Lan` otherwise) so nodes can join them while they are created,
//! 2. create the primary shared segment,
//! 3. create the server role, if any, at ordinal 0,
//! 4. create every other node, attaching shared segment, addressed extra
//!    segments, ephemeral storage, datasets and provisioning hooks,
//! 5. check graph consistency.
//!
//! Nothing is rendered here; a topology that comes out of
//! [`build_topology`] has already passed [`validate_topology`].

use log::{debug, info};

use crate::config::{DatasetConfig, ProfileConfig, SharedSegment};
use crate::defaults;
use crate::error::{ProfileError, ProfileResult};
use crate::ip::{segment_address, AddressRegistry};
use crate::process::{schedule_hooks, HookConfig};
use super::types::{
    Node, NodeId, NodeKind, NodeRole, SegmentId, SegmentKind, StorageVolume, Topology, TransportFlags,
    VolumeId,
};
use super::validate::validate_topology;

/// Build and validate the topology described by `config`
pub fn build_topology(config: &ProfileConfig) -> ProfileResult<Topology> {
    config.validate()?;

    info!(
        "Building topology: {} node(s), {} extra segment(s), server role: {}",
        config.node_count,
        config.extra_interface_count,
        config.server.as_ref().map_or("none", |server| server.name.as_str())
    );

    let mut builder = TopologyBuilder::new(config);
    builder.allocate_extra_segments();
    builder.allocate_shared_segment();
    builder.add_server();
    for ordinal in config.first_node_ordinal()..config.total_nodes() {
        builder.add_node(ordinal)?;
    }

    let topology = builder.finish();
    validate_topology(&topology)?;

    info!("Topology complete: {}", topology.summary());
    Ok(topology)
}

/// Mutable state of one build pass
struct TopologyBuilder<'a> {
    config: &'a ProfileConfig,
    topology: Topology,
    registry: AddressRegistry,
    shared: Option<SegmentId>,
    extra: Vec<SegmentId>,
    /// One shared volume per dataset list index, created on first use
    dataset_volumes: Vec<Option<VolumeId>>,
}

impl<'a> TopologyBuilder<'a> {
    fn new(config: &'a ProfileConfig) -> Self {
        let mut topology = Topology::new();
        topology.description = config.description.clone();
        topology.instructions = config.instructions.clone();
        TopologyBuilder {
            config,
            topology,
            registry: AddressRegistry::new(),
            shared: None,
            extra: Vec::new(),
            dataset_volumes: vec![None; config.datasets.len()],
        }
    }

    fn allocate_extra_segments(&mut self) {
        if !self.config.has_extra_segments() {
            if self.config.extra_interface_count > 0 {
                info!(
                    "Ignoring {} extra segment(s): a single node has no peer to share them with",
                    self.config.extra_interface_count
                );
            }
            return;
        }

        let (kind, prefix) = if self.config.node_count == 2 {
            (SegmentKind::Link, defaults::EXTRA_LINK_PREFIX)
        } else {
            (SegmentKind::Lan, defaults::EXTRA_LAN_PREFIX)
        };
        for index in 0..self.config.extra_interface_count {
            let name = format!("{}{}", prefix, index);
            debug!("Allocating extra segment {} ({:?})", name, kind);
            let id = self.topology.add_segment(name, kind, TransportFlags::default());
            self.extra.push(id);
        }
    }

    fn allocate_shared_segment(&mut self) {
        let create = match self.config.shared_segment {
            SharedSegment::Auto => self.config.total_nodes() >= 2,
            SharedSegment::Always => true,
            SharedSegment::Never => false,
        };
        if create {
            let id = self.topology.add_segment(
                self.config.shared_lan_name.clone(),
                SegmentKind::Lan,
                TransportFlags::shared(),
            );
            self.shared = Some(id);
        }
    }

    fn add_server(&mut self) {
        let config = self.config;
        let Some(server) = &config.server else {
            return;
        };

        let node = self.create_node(0, server.name.clone(), NodeRole::Server);
        if let Some(shared) = self.shared {
            self.topology.attach_node(node, shared, None);
        }
        self.attach_ephemeral(node);
        for (index, dataset) in config.present_datasets() {
            self.attach_dataset(node, index, dataset);
        }
        self.schedule(node, &config.provisioning.server_hooks);

        info!("Added server {} with {} dataset(s)", server.name, config.present_datasets().count());
    }

    fn add_node(&mut self, ordinal: u32) -> ProfileResult<()> {
        let config = self.config;
        let name = format!("{}{}", defaults::NODE_PREFIX, ordinal);
        let node = self.create_node(ordinal, name, NodeRole::Node);

        if let Some(shared) = self.shared {
            self.topology.attach_node(node, shared, None);
        }

        for (index, segment) in self.extra.clone().into_iter().enumerate() {
            let assignment = segment_address(index as u32, ordinal)
                .map_err(|e| ProfileError::configuration("extra_interface_count", e))?;
            let interface = self.topology.attach_node(node, segment, Some(assignment));
            let client_id = self.topology.interface(interface).client_id.clone();
            let segment_name = self.topology.segment(segment).name.clone();
            self.registry
                .register(&segment_name, &client_id, assignment)
                .map_err(ProfileError::GraphConsistency)?;
        }

        self.attach_ephemeral(node);

        // With a server role the datasets live on the server only
        if config.server.is_none() {
            for (index, dataset) in config.present_datasets() {
                self.attach_dataset(node, index, dataset);
            }
        }

        self.schedule(node, &config.provisioning.node_hooks);
        debug!(
            "Added {} with {} interface(s)",
            self.topology.node(node).name,
            self.topology.node(node).interfaces.len()
        );
        Ok(())
    }

    fn create_node(&mut self, ordinal: u32, name: String, role: NodeRole) -> NodeId {
        self.topology.add_node(Node {
            id: NodeId(0),
            ordinal,
            name,
            disk_image: self.config.disk_image.clone(),
            hardware_type: self.config.hardware_type.clone(),
            kind: NodeKind::from_virtual(self.config.use_virtual_machines),
            role,
            interfaces: Vec::new(),
            volumes: Vec::new(),
            services: Vec::new(),
        })
    }

    fn attach_ephemeral(&mut self, node: NodeId) {
        let config = self.config;
        let Some(storage) = &config.ephemeral_storage else {
            return;
        };
        let name = format!("{}-bs", self.topology.node(node).name);
        let volume = self.topology.add_volume(StorageVolume::Ephemeral {
            owner: node,
            name,
            size_gb: storage.resolved_size_gb(),
            mount_point: storage.mount_point.clone(),
            placement: storage.placement,
        });
        self.topology.nodes[node.index()].volumes.push(volume);
    }

    /// Connect `node` to dataset `index` through a fresh storage endpoint
    fn attach_dataset(&mut self, node: NodeId, index: usize, dataset: &DatasetConfig) {
        let volume = self.dataset_volume(index, dataset);
        let node_name = self.topology.node(node).name.clone();
        let link = self.topology.add_segment(
            format!("{}-{}-{}", defaults::DATASET_LINK_PREFIX, node_name, index),
            SegmentKind::Link,
            TransportFlags::shared(),
        );
        self.topology.add_endpoint(
            format!("{}-{}-{}", defaults::DATASET_NODE_PREFIX, node_name, index),
            volume,
            link,
        );
        self.topology.attach_node(node, link, None);
        self.topology.nodes[node.index()].volumes.push(volume);
        debug!("Attached dataset {} to {}", dataset.id, node_name);
    }

    fn dataset_volume(&mut self, index: usize, dataset: &DatasetConfig) -> VolumeId {
        if let Some(volume) = self.dataset_volumes[index] {
            return volume;
        }
        let volume = self.topology.add_volume(StorageVolume::Dataset {
            dataset: dataset.id.clone(),
            mount_point: dataset
                .mount_point
                .clone()
                .unwrap_or_else(|| defaults::dataset_mount_point(index)),
            read_only: dataset.read_only,
            writable_clone: dataset.writable_clone,
        });
        self.dataset_volumes[index] = Some(volume);
        volume
    }

    fn schedule(&mut self, node: NodeId, hooks: &[HookConfig]) {
        let services = schedule_hooks(hooks, &self.config.provisioning.user);
        self.topology.nodes[node.index()].services = services;
    }

    fn finish(self) -> Topology {
        self.topology
    }
}

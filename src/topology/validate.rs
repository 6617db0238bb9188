//! Graph consistency checks run before a topology is handed out.

use std::collections::{HashMap, HashSet};

use crate::error::{ProfileError, ProfileResult};
use super::types::{InterfaceOwner, SegmentKind, Topology};

/// Check the invariants every emitted topology must satisfy
///
/// - node, storage endpoint, segment and interface names are unique
/// - every segment has at least two members, and a `Link` exactly two
/// - every interface exists on exactly one owner and sits in exactly one
///   segment, the one it records
/// - addressed members of a segment share a netmask, have distinct
///   addresses, and fit the subnet
/// - provisioning services run in stage order
pub fn validate_topology(topology: &Topology) -> ProfileResult<()> {
    check_unique_names(topology)?;
    check_segments(topology)?;
    check_interfaces(topology)?;
    check_addressing(topology)?;
    check_service_order(topology)?;
    Ok(())
}

fn check_unique_names(topology: &Topology) -> ProfileResult<()> {
    let mut hosts = HashSet::new();
    let host_names = topology
        .nodes
        .iter()
        .map(|node| node.name.as_str())
        .chain(topology.endpoints.iter().map(|endpoint| endpoint.name.as_str()));
    for name in host_names {
        if !hosts.insert(name) {
            return Err(ProfileError::GraphConsistency(format!("duplicate node name '{}'", name)));
        }
    }

    let mut segments = HashSet::new();
    for segment in &topology.segments {
        if !segments.insert(segment.name.as_str()) {
            return Err(ProfileError::GraphConsistency(format!(
                "duplicate segment name '{}'",
                segment.name
            )));
        }
        if hosts.contains(segment.name.as_str()) {
            return Err(ProfileError::GraphConsistency(format!(
                "segment name '{}' collides with a node name",
                segment.name
            )));
        }
    }

    let mut interfaces = HashSet::new();
    for interface in &topology.interfaces {
        if !interfaces.insert(interface.client_id.as_str()) {
            return Err(ProfileError::GraphConsistency(format!(
                "duplicate interface id '{}'",
                interface.client_id
            )));
        }
    }
    Ok(())
}

fn check_segments(topology: &Topology) -> ProfileResult<()> {
    for segment in &topology.segments {
        if segment.members.len() < 2 {
            return Err(ProfileError::GraphConsistency(format!(
                "segment '{}' has {} member(s), at least 2 are required",
                segment.name,
                segment.members.len()
            )));
        }
        if segment.kind == SegmentKind::Link && segment.members.len() != 2 {
            return Err(ProfileError::GraphConsistency(format!(
                "point-to-point link '{}' has {} members",
                segment.name,
                segment.members.len()
            )));
        }
    }
    Ok(())
}

fn check_interfaces(topology: &Topology) -> ProfileResult<()> {
    let mut memberships: HashMap<usize, usize> = HashMap::new();
    for segment in &topology.segments {
        for member in &segment.members {
            let Some(interface) = topology.interfaces.get(member.index()) else {
                return Err(ProfileError::GraphConsistency(format!(
                    "segment '{}' references missing interface #{}",
                    segment.name,
                    member.index()
                )));
            };
            if interface.segment != segment.id {
                return Err(ProfileError::GraphConsistency(format!(
                    "interface '{}' is listed on segment '{}' but attached elsewhere",
                    interface.client_id, segment.name
                )));
            }
            *memberships.entry(member.index()).or_default() += 1;
        }
    }

    for interface in &topology.interfaces {
        match memberships.get(&interface.id.index()).copied().unwrap_or(0) {
            1 => {}
            count => {
                return Err(ProfileError::GraphConsistency(format!(
                    "interface '{}' belongs to {} segments, expected exactly 1",
                    interface.client_id, count
                )));
            }
        }

        let owned = match interface.owner {
            InterfaceOwner::Node(node) => topology
                .nodes
                .get(node.index())
                .is_some_and(|node| node.interfaces.iter().filter(|i| **i == interface.id).count() == 1),
            InterfaceOwner::Endpoint(endpoint) => topology
                .endpoints
                .get(endpoint.index())
                .is_some_and(|endpoint| endpoint.interface == interface.id),
        };
        if !owned {
            return Err(ProfileError::GraphConsistency(format!(
                "interface '{}' is not held by its owner",
                interface.client_id
            )));
        }
    }
    Ok(())
}

fn check_addressing(topology: &Topology) -> ProfileResult<()> {
    for segment in &topology.segments {
        let addressed: Vec<_> = segment
            .members
            .iter()
            .filter_map(|member| {
                let interface = topology.interface(*member);
                interface.address.map(|address| (interface, address))
            })
            .collect();
        let Some((_, first)) = addressed.first() else {
            continue;
        };

        let mut seen = HashSet::new();
        for (interface, assignment) in &addressed {
            if assignment.netmask != first.netmask || assignment.network() != first.network() {
                return Err(ProfileError::GraphConsistency(format!(
                    "interface '{}' ({}) is outside subnet {}/{} of segment '{}'",
                    interface.client_id,
                    assignment,
                    first.network(),
                    first.prefix_len(),
                    segment.name
                )));
            }
            if !seen.insert(assignment.address) {
                return Err(ProfileError::GraphConsistency(format!(
                    "address {} appears twice on segment '{}' (second holder '{}')",
                    assignment.address,
                    segment.name,
                    topology.owner_name(interface)
                )));
            }
        }

        if segment.members.len() as u64 > first.host_capacity() {
            return Err(ProfileError::GraphConsistency(format!(
                "segment '{}' has {} members but its /{} subnet holds {}",
                segment.name,
                segment.members.len(),
                first.prefix_len(),
                first.host_capacity()
            )));
        }
    }
    Ok(())
}

fn check_service_order(topology: &Topology) -> ProfileResult<()> {
    for node in &topology.nodes {
        if let Some(pair) = node.services.windows(2).find(|pair| pair[0].stage > pair[1].stage) {
            return Err(ProfileError::GraphConsistency(format!(
                "provisioning services on '{}' are out of stage order: {} after {}",
                node.name,
                pair[1].stage.as_str(),
                pair[0].stage.as_str()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::ip::{segment_address, AddressAssignment};
    use crate::process::{ExecuteService, HookStage};
    use crate::topology::build_topology;
    use crate::topology::types::{Node, NodeId, NodeKind, NodeRole, TransportFlags};
    use std::net::Ipv4Addr;

    fn bare_node(topology: &mut Topology, name: &str) -> NodeId {
        topology.add_node(Node {
            id: NodeId(0),
            ordinal: topology.nodes.len() as u32,
            name: name.to_string(),
            disk_image: "img".to_string(),
            hardware_type: None,
            kind: NodeKind::RawPc,
            role: NodeRole::Node,
            interfaces: Vec::new(),
            volumes: Vec::new(),
            services: Vec::new(),
        })
    }

    #[test]
    fn test_built_topology_is_valid() {
        let mut config = ProfileConfig::with_node_count(5);
        config.extra_interface_count = 2;
        let topology = build_topology(&config).unwrap();
        assert!(validate_topology(&topology).is_ok());
    }

    #[test]
    fn test_one_member_segment_rejected() {
        let mut topology = Topology::new();
        let a = bare_node(&mut topology, "a");
        let lan = topology.add_segment("lan".to_string(), SegmentKind::Lan, TransportFlags::default());
        topology.attach_node(a, lan, None);

        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("segment 'lan' has 1 member"));
    }

    #[test]
    fn test_link_with_three_members_rejected() {
        let mut topology = Topology::new();
        let link = topology.add_segment("p2p".to_string(), SegmentKind::Link, TransportFlags::default());
        for name in ["a", "b", "c"] {
            let node = bare_node(&mut topology, name);
            topology.attach_node(node, link, None);
        }
        assert!(validate_topology(&topology).is_err());
    }

    #[test]
    fn test_duplicate_node_names_rejected() {
        let mut topology = Topology::new();
        let lan = topology.add_segment("lan".to_string(), SegmentKind::Lan, TransportFlags::default());
        for _ in 0..2 {
            let node = bare_node(&mut topology, "twin");
            topology.attach_node(node, lan, None);
        }
        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("duplicate node name 'twin'"));
    }

    #[test]
    fn test_mixed_subnets_rejected() {
        let mut topology = Topology::new();
        let lan = topology.add_segment("lan0".to_string(), SegmentKind::Lan, TransportFlags::default());
        let a = bare_node(&mut topology, "a");
        let b = bare_node(&mut topology, "b");
        topology.attach_node(a, lan, Some(segment_address(0, 0).unwrap()));
        topology.attach_node(
            b,
            lan,
            Some(AddressAssignment {
                address: Ipv4Addr::new(192, 168, 0, 2),
                netmask: Ipv4Addr::new(255, 255, 0, 0),
            }),
        );
        assert!(validate_topology(&topology).is_err());
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let mut topology = Topology::new();
        let lan = topology.add_segment("lan0".to_string(), SegmentKind::Lan, TransportFlags::default());
        for name in ["a", "b"] {
            let node = bare_node(&mut topology, name);
            topology.attach_node(node, lan, Some(segment_address(0, 0).unwrap()));
        }
        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("appears twice on segment 'lan0' (second holder 'b')"));
    }

    #[test]
    fn test_unattached_interface_rejected() {
        let mut config = ProfileConfig::with_node_count(2);
        config.extra_interface_count = 1;
        let mut topology = build_topology(&config).unwrap();
        topology.segments[0].members.pop();
        assert!(validate_topology(&topology).is_err());
    }

    #[test]
    fn test_service_order_checked() {
        let mut topology = Topology::new();
        let lan = topology.add_segment("lan".to_string(), SegmentKind::Lan, TransportFlags::default());
        let a = bare_node(&mut topology, "a");
        let b = bare_node(&mut topology, "b");
        topology.attach_node(a, lan, None);
        topology.attach_node(b, lan, None);
        topology.nodes[0].services = vec![
            ExecuteService {
                stage: HookStage::Customize,
                shell: "sh".to_string(),
                command: "true".to_string(),
            },
            ExecuteService {
                stage: HookStage::BaseSetup,
                shell: "sh".to_string(),
                command: "true".to_string(),
            },
        ];
        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("stage order: base_setup after customize"));
    }
}

//! Address registry.
//!
//! Tracks which interface holds which address on each segment so the
//! builder can refuse a duplicate instead of emitting it.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::allocator::AddressAssignment;

/// Per-segment registry of static assignments
#[derive(Debug, Default)]
pub struct AddressRegistry {
    /// segment name -> (address -> interface client id)
    assigned: HashMap<String, HashMap<Ipv4Addr, String>>,
    /// segment name -> netmask shared by its members
    netmasks: HashMap<String, Ipv4Addr>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `assignment` for `interface_id` on `segment`
    ///
    /// Fails if the address is taken on that segment or the netmask differs
    /// from the one already registered for it.
    pub fn register(
        &mut self,
        segment: &str,
        interface_id: &str,
        assignment: AddressAssignment,
    ) -> Result<(), String> {
        if let Some(netmask) = self.netmasks.get(segment) {
            if *netmask != assignment.netmask {
                return Err(format!(
                    "interface {} uses netmask {} on segment {}, which already uses {}",
                    interface_id, assignment.netmask, segment, netmask
                ));
            }
        }

        let addresses = self.assigned.entry(segment.to_string()).or_default();
        if let Some(holder) = addresses.get(&assignment.address) {
            return Err(format!(
                "address {} on segment {} is already assigned to {}",
                assignment.address, segment, holder
            ));
        }

        addresses.insert(assignment.address, interface_id.to_string());
        self.netmasks.insert(segment.to_string(), assignment.netmask);
        log::debug!("Registered {} for {} on {}", assignment, interface_id, segment);
        Ok(())
    }

    /// Interface holding `address` on `segment`, if any
    pub fn holder(&self, segment: &str, address: Ipv4Addr) -> Option<&str> {
        self.assigned
            .get(segment)
            .and_then(|addresses| addresses.get(&address))
            .map(String::as_str)
    }

    /// Total number of registered assignments
    pub fn len(&self) -> usize {
        self.assigned.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::segment_address;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = AddressRegistry::new();
        registry.register("lan0", "node0:if1", segment_address(0, 0).unwrap()).unwrap();
        registry.register("lan0", "node1:if1", segment_address(0, 1).unwrap()).unwrap();
        registry.register("lan1", "node0:if2", segment_address(1, 0).unwrap()).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.holder("lan0", Ipv4Addr::new(192, 168, 0, 2)), Some("node1:if1"));
        assert_eq!(registry.holder("lan1", Ipv4Addr::new(192, 168, 0, 2)), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = AddressRegistry::new();
        registry.register("lan0", "node0:if1", segment_address(0, 0).unwrap()).unwrap();
        let err = registry.register("lan0", "node9:if1", segment_address(0, 0).unwrap()).unwrap_err();
        assert!(err.contains("node0:if1"));
    }

    #[test]
    fn test_netmask_mismatch_rejected() {
        let mut registry = AddressRegistry::new();
        registry.register("lan0", "node0:if1", segment_address(0, 0).unwrap()).unwrap();
        let odd = AddressAssignment {
            address: Ipv4Addr::new(192, 168, 0, 9),
            netmask: Ipv4Addr::new(255, 255, 0, 0),
        };
        assert!(registry.register("lan0", "node8:if1", odd).is_err());
    }
}

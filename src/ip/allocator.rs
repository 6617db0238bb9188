//! Deterministic address derivation for extra segments.

use serde::Serialize;
use std::net::Ipv4Addr;

use crate::config::{MAX_EXTRA_SEGMENTS, MAX_HOST_OCTET};
use crate::defaults::{EXTRA_SEGMENT_NETMASK, EXTRA_SEGMENT_PREFIX};

/// Static IPv4 assignment on one interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AddressAssignment {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl AddressAssignment {
    /// Prefix length of the netmask (24 for `255.255.255.0`)
    pub fn prefix_len(&self) -> u32 {
        u32::from(self.netmask).count_ones()
    }

    /// Network address of the subnet
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & u32::from(self.netmask))
    }

    /// Usable host addresses in the subnet (network and broadcast excluded)
    pub fn host_capacity(&self) -> u64 {
        let host_bits = 32 - self.prefix_len();
        (1u64 << host_bits).saturating_sub(2)
    }
}

impl std::fmt::Display for AddressAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len())
    }
}

/// Address of node `ordinal` on extra segment `segment_index`
///
/// Always `192.168.{segment_index}.{ordinal + 1}` with mask
/// `255.255.255.0`. Fails when either component leaves its octet.
///
/// # Examples
/// ```
/// use rspecgen::ip::segment_address;
///
/// let assignment = segment_address(2, 0).unwrap();
/// assert_eq!(assignment.to_string(), "192.168.2.1/24");
/// ```
pub fn segment_address(segment_index: u32, ordinal: u32) -> Result<AddressAssignment, String> {
    if segment_index >= MAX_EXTRA_SEGMENTS {
        return Err(format!(
            "segment index {} does not fit the third octet",
            segment_index
        ));
    }
    let host = ordinal + 1;
    if host > MAX_HOST_OCTET {
        return Err(format!(
            "node ordinal {} gives host octet {}, beyond {}",
            ordinal, host, MAX_HOST_OCTET
        ));
    }

    let [a, b] = EXTRA_SEGMENT_PREFIX;
    Ok(AddressAssignment {
        address: Ipv4Addr::new(a, b, segment_index as u8, host as u8),
        netmask: Ipv4Addr::from(EXTRA_SEGMENT_NETMASK),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_scheme() {
        let assignment = segment_address(0, 0).unwrap();
        assert_eq!(assignment.address, Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(assignment.netmask, Ipv4Addr::new(255, 255, 255, 0));

        let assignment = segment_address(3, 9).unwrap();
        assert_eq!(assignment.to_string(), "192.168.3.10/24");
        assert_eq!(assignment.network(), Ipv4Addr::new(192, 168, 3, 0));
        assert_eq!(assignment.host_capacity(), 254);
    }

    #[test]
    fn test_address_bounds() {
        assert!(segment_address(255, 253).is_ok());
        assert!(segment_address(256, 0).is_err());
        assert!(segment_address(0, 254).is_err());
    }

    #[test]
    fn test_deterministic() {
        for j in 0..4 {
            for i in 0..8 {
                assert_eq!(segment_address(j, i), segment_address(j, i));
            }
        }
    }
}

//! IPv4 network parsing and deterministic host enumeration.
//!
//! [`Network::hosts`] walks a subnet octet by octet, the same way the
//! shaper provisions subscribers: the last octet runs from 2 to 254 and
//! carries into the third octet, which carries into the second, and so
//! on. `.0`, `.1` and `.255` of every /24 are never produced. The walk
//! is pure, so the same network and count always yield the same list.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Lowest last octet handed to a subscriber.
const FIRST_HOST_OCTET: i64 = 2;
/// Highest last octet handed to a subscriber.
const LAST_HOST_OCTET: i64 = 254;

/// A parsed `address/prefix` network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    network: u32,
    broadcast: u32,
    prefix_len: u8,
}

impl Network {
    /// Parse `a.b.c.d/len`. Host bits in the address are masked off.
    pub fn parse(cidr: &str) -> Result<Self> {
        let invalid = || Error::InvalidNetwork(cidr.to_string());

        let (addr, prefix) = cidr.trim().split_once('/').ok_or_else(invalid)?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
        let prefix_len: u8 = prefix.parse().map_err(|_| invalid())?;
        if prefix_len > 32 {
            return Err(invalid());
        }

        let mask = ((0xFFFF_FFFFu64 << (32 - u32::from(prefix_len))) & 0xFFFF_FFFF) as u32;
        let network = u32::from(addr) & mask;
        let broadcast = network | !mask;

        Ok(Self {
            network,
            broadcast,
            prefix_len,
        })
    }

    /// Network address as a 32-bit value.
    pub fn network_u32(&self) -> u32 {
        self.network
    }

    /// Broadcast address as a 32-bit value.
    pub fn broadcast_u32(&self) -> u32 {
        self.broadcast
    }

    /// Network address.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    /// Broadcast address.
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.broadcast)
    }

    /// Prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Enumerate the first `count` subscriber addresses in ascending order.
    ///
    /// Fails with [`Error::InsufficientAddresses`] when the network runs
    /// out first; partial results are never returned.
    pub fn hosts(&self, count: usize) -> Result<Vec<Ipv4Addr>> {
        let [n1, n2, n3, n4] = self.network.to_be_bytes().map(i64::from);
        let [b1, b2, b3, b4] = self.broadcast.to_be_bytes().map(i64::from);
        let last_octet4 = LAST_HOST_OCTET.min(b4 - 1);

        let (mut o1, mut o2, mut o3) = (n1, n2, n3);
        let mut o4 = FIRST_HOST_OCTET.max(n4 + 1);

        let mut hosts = Vec::with_capacity(count.min(1 << 16));
        while hosts.len() < count {
            if o1 > b1
                || (o1 == b1 && o2 > b2)
                || (o1 == b1 && o2 == b2 && o3 > b3)
                || (o1 == b1 && o2 == b2 && o3 == b3 && o4 > last_octet4)
            {
                break;
            }

            let candidate = (o1 << 24) | (o2 << 16) | (o3 << 8) | o4;
            if candidate >= i64::from(self.network) && candidate <= i64::from(self.broadcast) {
                hosts.push(Ipv4Addr::new(o1 as u8, o2 as u8, o3 as u8, o4 as u8));
            }

            o4 += 1;
            if o4 > LAST_HOST_OCTET {
                o4 = FIRST_HOST_OCTET;
                o3 += 1;
                if o3 > 255 {
                    o3 = 0;
                    o2 += 1;
                    if o2 > 255 {
                        o2 = 0;
                        o1 += 1;
                    }
                }
            }
        }

        if hosts.len() < count {
            return Err(Error::InsufficientAddresses {
                requested: count,
                available: hosts.len(),
            });
        }
        Ok(hosts)
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(cidr: &str, count: usize) -> Result<Vec<String>> {
        Network::parse(cidr)?
            .hosts(count)
            .map(|v| v.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn test_parse_slash24() {
        let net = Network::parse("10.0.0.0/24").unwrap();
        assert_eq!(net.network_u32(), 0x0A00_0000);
        assert_eq!(net.broadcast_u32(), 0x0A00_00FF);
        assert_eq!(net.prefix_len(), 24);
        assert_eq!(net.to_string(), "10.0.0.0/24");
    }

    #[test]
    fn test_parse_masks_host_bits() {
        let net = Network::parse("192.168.5.77/22").unwrap();
        assert_eq!(net.network(), Ipv4Addr::new(192, 168, 4, 0));
        assert_eq!(net.broadcast(), Ipv4Addr::new(192, 168, 7, 255));
    }

    #[test]
    fn test_parse_edges() {
        let all = Network::parse("0.0.0.0/0").unwrap();
        assert_eq!(all.network_u32(), 0);
        assert_eq!(all.broadcast_u32(), u32::MAX);

        let host = Network::parse("10.1.2.3/32").unwrap();
        assert_eq!(host.network_u32(), host.broadcast_u32());
    }

    #[test]
    fn test_parse_invalid() {
        for bad in [
            "10.0.0.0",
            "10.0.0.0/",
            "10.0.0.0/33",
            "10.0.0/24",
            "10.0.0.0/-1",
            "ten.0.0.0/8",
            "10.0.0.0/24/1",
        ] {
            let err = Network::parse(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidNetwork(_)), "{bad}");
        }
    }

    #[test]
    fn test_hosts_slash24() {
        assert_eq!(
            hosts("10.0.0.0/24", 3).unwrap(),
            ["10.0.0.2", "10.0.0.3", "10.0.0.4"]
        );
    }

    #[test]
    fn test_hosts_slash30_insufficient() {
        let err = hosts("10.0.0.0/30", 5).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientAddresses {
                requested: 5,
                available: 1
            }
        ));
        assert_eq!(hosts("10.0.0.0/30", 1).unwrap(), ["10.0.0.2"]);
    }

    #[test]
    fn test_hosts_full_slash24() {
        let all = hosts("10.0.0.0/24", 253).unwrap();
        assert_eq!(all.first().unwrap(), "10.0.0.2");
        assert_eq!(all.last().unwrap(), "10.0.0.254");
        assert!(hosts("10.0.0.0/24", 254).unwrap_err().is_insufficient());
    }

    #[test]
    fn test_hosts_carry_into_third_octet() {
        let list = hosts("10.0.0.0/23", 255).unwrap();
        assert_eq!(list[252], "10.0.0.254");
        assert_eq!(list[253], "10.0.1.2");
        assert_eq!(list[254], "10.0.1.3");
    }

    #[test]
    fn test_hosts_unaligned_start() {
        let list = hosts("10.0.0.16/28", 3).unwrap();
        assert_eq!(list, ["10.0.0.17", "10.0.0.18", "10.0.0.19"]);
        // .31 is broadcast, so .30 is the last host
        assert_eq!(hosts("10.0.0.16/28", 14).unwrap().last().unwrap(), "10.0.0.30");
        assert!(hosts("10.0.0.16/28", 15).is_err());
    }

    #[test]
    fn test_hosts_zero_count() {
        assert!(hosts("10.0.0.0/30", 0).unwrap().is_empty());
    }

    #[test]
    fn test_hosts_restartable() {
        let net = Network::parse("172.16.0.0/16").unwrap();
        let first = net.hosts(600).unwrap();
        let second = net.hosts(600).unwrap();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }
}

//! Classifier ID derivation.
//!
//! Every subscriber address maps to a fixed position in the shaper's
//! traffic-control hierarchy: an HTB class `1:<hash>` and a u32 hash
//! filter `<table>:<bucket>:<filter>`. The mapping only looks at the
//! third and fourth octets, so it is collision-free only when the
//! monitored population lives inside a single /16-equivalent span.
//! Addresses sharing octets 3 and 4 across different /16s always
//! collide, and the derivation makes no attempt to avoid that.
//!
//! # Example
//!
//! ```
//! use subshape::classifier::ClassifierId;
//!
//! let id = ClassifierId::derive("10.20.1.5").unwrap();
//! assert_eq!(id.hash(), 0x0105);
//! assert_eq!(id.classid(), "1:261");
//! assert_eq!(id.full_handle(), "02:5:106");
//! ```

use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

/// Filter IDs live in a 12-bit space.
const FILTER_ID_MASK: u32 = 0x0fff;

/// Derived traffic-control identifiers for one IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClassifierId {
    octet3: u8,
    octet4: u8,
    hash: u16,
}

impl ClassifierId {
    /// Derive the identifiers from a dotted-quad string.
    ///
    /// Returns `None` when the string does not hold four numeric octets.
    pub fn derive(ip: &str) -> Option<Self> {
        let mut octets = [0u8; 4];
        let mut parts = ip.trim().split('.');
        for slot in &mut octets {
            *slot = parts.next()?.parse().ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self::from_addr(Ipv4Addr::from(octets)))
    }

    /// Derive the identifiers from a parsed address.
    pub fn from_addr(addr: Ipv4Addr) -> Self {
        let [_, _, octet3, octet4] = addr.octets();
        // Bucket 0 is never used by the shaper.
        let hash = match (u16::from(octet3) << 8) | u16::from(octet4) {
            0 => 1,
            h => h,
        };
        Self {
            octet3,
            octet4,
            hash,
        }
    }

    /// Third octet of the source address.
    pub fn octet3(&self) -> u8 {
        self.octet3
    }

    /// Fourth octet of the source address.
    pub fn octet4(&self) -> u8 {
        self.octet4
    }

    /// The 16-bit class hash. Never zero.
    pub fn hash(&self) -> u16 {
        self.hash
    }

    /// Hash table ID (third octet + 1).
    pub fn table_id(&self) -> u16 {
        u16::from(self.octet3) + 1
    }

    /// Hash table ID as two-digit (at least) lowercase hex.
    pub fn table_id_hex(&self) -> String {
        format!("{:02x}", self.table_id())
    }

    /// Bucket inside the hash table, unpadded hex.
    pub fn bucket_hex(&self) -> String {
        format!("{:x}", self.octet4)
    }

    /// Filter ID, `(hash + 1) mod 4096`.
    pub fn filter_id(&self) -> u16 {
        ((u32::from(self.hash) + 1) & FILTER_ID_MASK) as u16
    }

    /// Filter ID as unpadded lowercase hex.
    pub fn filter_id_hex(&self) -> String {
        format!("{:x}", self.filter_id())
    }

    /// Full u32 filter handle, `table:bucket:filter`.
    pub fn full_handle(&self) -> String {
        format!(
            "{}:{}:{}",
            self.table_id_hex(),
            self.bucket_hex(),
            self.filter_id_hex()
        )
    }

    /// Class ID with a decimal minor, `1:<hash>`.
    pub fn classid(&self) -> String {
        format!("1:{}", self.hash)
    }

    /// Class ID with a hex minor, `1:0x<hash>`.
    pub fn classid_hex(&self) -> String {
        format!("1:0x{:x}", self.hash)
    }
}

impl fmt::Display for ClassifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.classid(), self.full_handle())
    }
}

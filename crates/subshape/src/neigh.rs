//! Neighbor table and subscriber set parsing.
//!
//! Both inputs are free text: `ip neigh show` prints one neighbor per
//! line, `nft list set` prints the set body with its elements inline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::parse::{ipv4_tokens, is_mac};

/// Neighbor unreachability detection state (NUD_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NeighborState {
    None,
    Incomplete,
    Reachable,
    Stale,
    Delay,
    Probe,
    Failed,
    Noarp,
    Permanent,
}

impl NeighborState {
    /// Get the name of this state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Incomplete => "INCOMPLETE",
            Self::Reachable => "REACHABLE",
            Self::Stale => "STALE",
            Self::Delay => "DELAY",
            Self::Probe => "PROBE",
            Self::Failed => "FAILED",
            Self::Noarp => "NOARP",
            Self::Permanent => "PERMANENT",
        }
    }

    /// Parse a state word, case-insensitively.
    pub fn from_name(word: &str) -> Option<Self> {
        const ALL: [NeighborState; 9] = [
            NeighborState::None,
            NeighborState::Incomplete,
            NeighborState::Reachable,
            NeighborState::Stale,
            NeighborState::Delay,
            NeighborState::Probe,
            NeighborState::Failed,
            NeighborState::Noarp,
            NeighborState::Permanent,
        ];
        ALL.into_iter().find(|s| s.name().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for NeighborState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-letter reachability classification shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NeighborFlag {
    /// `P`: static entry.
    #[serde(rename = "P")]
    Permanent,
    /// `D`: confirmation pending.
    #[serde(rename = "D")]
    Delay,
    /// `R`: recently confirmed.
    #[serde(rename = "R")]
    Reachable,
    /// `I`: resolution incomplete or failed.
    #[serde(rename = "I")]
    Incomplete,
}

impl NeighborFlag {
    /// The flag letter.
    pub fn letter(&self) -> char {
        match self {
            Self::Permanent => 'P',
            Self::Delay => 'D',
            Self::Reachable => 'R',
            Self::Incomplete => 'I',
        }
    }

    /// Classify a neighbor line.
    ///
    /// Priority: PERMANENT, DELAY, REACHABLE, then INCOMPLETE or FAILED.
    pub fn classify<'a>(words: impl IntoIterator<Item = &'a str> + Clone) -> Option<Self> {
        let has = |wanted: &[&str]| {
            words
                .clone()
                .into_iter()
                .any(|w| wanted.iter().any(|x| w.eq_ignore_ascii_case(x)))
        };
        if has(&["PERMANENT"]) {
            Some(Self::Permanent)
        } else if has(&["DELAY"]) {
            Some(Self::Delay)
        } else if has(&["REACHABLE"]) {
            Some(Self::Reachable)
        } else if has(&["INCOMPLETE", "FAILED"]) {
            Some(Self::Incomplete)
        } else {
            None
        }
    }
}

impl fmt::Display for NeighborFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.letter())
    }
}

/// Address column of a neighbor line.
///
/// Dotted-decimal text that is not a valid IPv4 address is kept as
/// written so the host still shows up in a report. Valid addresses sort
/// first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum HostAddr {
    V4(Ipv4Addr),
    Malformed(String),
}

impl HostAddr {
    /// Classify an address token.
    pub fn parse(token: &str) -> Self {
        token
            .parse()
            .map(Self::V4)
            .unwrap_or_else(|_| Self::Malformed(token.to_string()))
    }

    /// The IPv4 address, if the text was one.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            Self::V4(addr) => Some(*addr),
            Self::Malformed(_) => None,
        }
    }
}

impl From<Ipv4Addr> for HostAddr {
    fn from(addr: Ipv4Addr) -> Self {
        Self::V4(addr)
    }
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(addr) => fmt::Display::fmt(addr, f),
            Self::Malformed(text) => f.write_str(text),
        }
    }
}

/// One IPv4 entry from the neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborEntry {
    pub addr: HostAddr,
    pub mac: Option<String>,
    pub state: Option<NeighborState>,
    pub flag: Option<NeighborFlag>,
}

impl NeighborEntry {
    /// Parse one `ip neigh show` line.
    ///
    /// Lines whose first word is not made of digits and dots (IPv6,
    /// garbage) yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let token = words.next()?;
        if !token.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return None;
        }
        // The address must be followed by something.
        words.clone().next()?;
        let addr = HostAddr::parse(token);

        let mac = words.clone().find(|w| is_mac(w)).map(str::to_string);
        let state = words.clone().filter_map(NeighborState::from_name).last();
        let flag = NeighborFlag::classify(words);

        Some(Self {
            addr,
            mac,
            state,
            flag,
        })
    }
}

/// Parse `ip neigh show` output, keyed by address.
///
/// A later line for the same address replaces an earlier one.
pub fn parse_neighbors(text: &str) -> BTreeMap<HostAddr, NeighborEntry> {
    text.lines()
        .filter_map(NeighborEntry::parse_line)
        .map(|entry| (entry.addr.clone(), entry))
        .collect()
}

/// Parse the members of an nft set listing.
pub fn parse_set_members(text: &str) -> BTreeSet<Ipv4Addr> {
    ipv4_tokens(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> HostAddr {
        Ipv4Addr::new(a, b, c, d).into()
    }

    const NEIGH: &str = "\
10.0.1.5 dev eth0 lladdr 00:11:22:33:44:55 REACHABLE
10.0.1.6 dev eth0 lladdr 00:11:22:33:44:66 STALE
10.0.1.7 dev eth0  FAILED
10.0.1.8 dev eth0 lladdr AA:BB:CC:DD:EE:FF PERMANENT
10.0.1.9 dev eth0 lladdr 00:11:22:33:44:99 DELAY
10.0.1.10 dev eth0 INCOMPLETE
fe80::1 dev eth0 lladdr 00:11:22:33:44:00 router STALE
garbage line
";

    #[test]
    fn test_parse_neighbors() {
        let table = parse_neighbors(NEIGH);
        assert_eq!(table.len(), 6);

        let e = &table[&v4(10, 0, 1, 5)];
        assert_eq!(e.mac.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(e.state, Some(NeighborState::Reachable));
        assert_eq!(e.flag, Some(NeighborFlag::Reachable));

        let stale = &table[&v4(10, 0, 1, 6)];
        assert_eq!(stale.state, Some(NeighborState::Stale));
        assert_eq!(stale.flag, None);

        let failed = &table[&v4(10, 0, 1, 7)];
        assert_eq!(failed.mac, None);
        assert_eq!(failed.flag, Some(NeighborFlag::Incomplete));

        assert_eq!(
            table[&v4(10, 0, 1, 8)].flag,
            Some(NeighborFlag::Permanent)
        );
        assert_eq!(
            table[&v4(10, 0, 1, 9)].flag,
            Some(NeighborFlag::Delay)
        );
        assert_eq!(
            table[&v4(10, 0, 1, 10)].flag,
            Some(NeighborFlag::Incomplete)
        );
    }

    #[test]
    fn test_flag_priority() {
        let words = "permanent reachable failed".split_whitespace();
        assert_eq!(NeighborFlag::classify(words), Some(NeighborFlag::Permanent));
        let words = "failed reachable".split_whitespace();
        assert_eq!(NeighborFlag::classify(words), Some(NeighborFlag::Reachable));
        assert_eq!(NeighborFlag::classify("stale probe".split_whitespace()), None);
    }

    #[test]
    fn test_later_line_wins() {
        let table = parse_neighbors("10.0.0.2 dev eth0 FAILED\n10.0.0.2 dev eth1 lladdr 00:00:00:00:00:01 REACHABLE\n");
        let e = &table[&v4(10, 0, 0, 2)];
        assert_eq!(e.flag, Some(NeighborFlag::Reachable));
        assert_eq!(e.mac.as_deref(), Some("00:00:00:00:00:01"));
    }

    #[test]
    fn test_malformed_address_kept() {
        let table = parse_neighbors(
            "10.0.1 dev eth0 lladdr 00:11:22:33:44:55 REACHABLE\n10.0.0.2 dev eth0 STALE\n",
        );
        assert_eq!(table.len(), 2);
        let keys: Vec<_> = table.keys().map(HostAddr::to_string).collect();
        assert_eq!(keys, ["10.0.0.2", "10.0.1"]);

        let e = &table[&HostAddr::Malformed("10.0.1".into())];
        assert_eq!(e.addr.ipv4(), None);
        assert_eq!(e.mac.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(e.flag, Some(NeighborFlag::Reachable));

        assert_eq!(HostAddr::parse("300.1.1.1"), HostAddr::Malformed("300.1.1.1".into()));
        assert!(NeighborEntry::parse_line("10.0.x.1 dev eth0 REACHABLE").is_none());
    }

    #[test]
    fn test_bare_address_rejected() {
        assert!(NeighborEntry::parse_line("10.0.0.2").is_none());
        assert!(NeighborEntry::parse_line(" 10.0.0.2 dev eth0").is_some());
    }

    #[test]
    fn test_flag_display() {
        assert_eq!(NeighborFlag::Delay.to_string(), "[D]");
        assert_eq!(NeighborState::Noarp.to_string(), "NOARP");
        assert_eq!(NeighborState::from_name("stale"), Some(NeighborState::Stale));
        assert_eq!(NeighborState::from_name("lladdr"), None);
    }

    #[test]
    fn test_parse_set_members() {
        let out = "\
table inet filter {
\tset subscribers {
\t\ttype ipv4_addr
\t\tflags timeout
\t\telements = { 10.0.1.5 expires 59m58s, 10.0.1.6,
\t\t\t     10.0.1.5 }
\t}
}
";
        let members = parse_set_members(out);
        assert_eq!(
            members.into_iter().collect::<Vec<_>>(),
            [Ipv4Addr::new(10, 0, 1, 5), Ipv4Addr::new(10, 0, 1, 6)]
        );
        assert!(parse_set_members("").is_empty());
    }
}

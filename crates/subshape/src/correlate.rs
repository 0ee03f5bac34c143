//! Correlation of subscribers with collected traffic-control state.
//!
//! Classes are joined to a subscriber through its classifier hash,
//! filters through the subscriber's address appearing in the filter's
//! match selectors. Both indexes are built once per snapshot and only
//! read afterwards.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::net::Ipv4Addr;

use crate::classifier::ClassifierId;
use crate::collector::Snapshot;
use crate::neigh::{HostAddr, NeighborEntry, NeighborFlag, NeighborState};
use crate::parse::ipv4_tokens;
use crate::rate::{UNLIMITED, format_rate};
use crate::tc::{TcClass, TcFilter};

/// A subscriber address with its neighbor-table view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub addr: HostAddr,
    pub state: Option<NeighborState>,
    pub mac: Option<String>,
    pub flag: Option<NeighborFlag>,
    /// Present in the subscriber set.
    pub active: bool,
}

impl Subscriber {
    /// A subscriber with no neighbor entry.
    pub fn new(addr: impl Into<HostAddr>) -> Self {
        Self {
            addr: addr.into(),
            state: None,
            mac: None,
            flag: None,
            active: false,
        }
    }

    fn from_neighbor(entry: &NeighborEntry) -> Self {
        Self {
            addr: entry.addr.clone(),
            state: entry.state,
            mac: entry.mac.clone(),
            flag: entry.flag,
            active: false,
        }
    }
}

/// Every address seen in the subscriber set or the neighbor table, in
/// ascending address order. Malformed neighbor addresses come last.
pub fn subscribers(snapshot: &Snapshot) -> Vec<Subscriber> {
    let addrs: BTreeSet<HostAddr> = snapshot
        .active
        .iter()
        .copied()
        .map(HostAddr::V4)
        .chain(snapshot.neighbors.keys().cloned())
        .collect();

    addrs
        .into_iter()
        .map(|addr| {
            let mut sub = snapshot
                .neighbors
                .get(&addr)
                .map(Subscriber::from_neighbor)
                .unwrap_or_else(|| Subscriber::new(addr.clone()));
            sub.active = addr.ipv4().is_some_and(|a| snapshot.active.contains(&a));
            sub
        })
        .collect()
}

/// Classes grouped by the 16-bit minor of their class ID.
#[derive(Debug, Default)]
pub struct ClassesByHash<'a> {
    map: HashMap<u16, Vec<&'a TcClass>>,
}

impl<'a> ClassesByHash<'a> {
    /// Index classes, keeping encounter order within each hash.
    pub fn new(classes: &'a [TcClass]) -> Self {
        let mut map: HashMap<u16, Vec<&'a TcClass>> = HashMap::new();
        for class in classes {
            match class.minor() {
                Some(minor) => map.entry(minor).or_default().push(class),
                None => tracing::trace!(classid = %class.classid, "class not indexed"),
            }
        }
        Self { map }
    }

    /// Classes whose minor equals `hash`.
    pub fn get(&self, hash: u16) -> &[&'a TcClass] {
        self.map.get(&hash).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Filters grouped by the IPv4 addresses their selectors mention.
#[derive(Debug, Default)]
pub struct FiltersByIp<'a> {
    map: HashMap<Ipv4Addr, Vec<&'a TcFilter>>,
}

impl<'a> FiltersByIp<'a> {
    /// Index filters, keeping encounter order within each address.
    pub fn new(filters: &'a [TcFilter]) -> Self {
        let mut map: HashMap<Ipv4Addr, Vec<&'a TcFilter>> = HashMap::new();
        for filter in filters {
            let addrs: BTreeSet<Ipv4Addr> = ipv4_tokens(&filter.details).collect();
            for addr in addrs {
                map.entry(addr).or_default().push(filter);
            }
        }
        Self { map }
    }

    /// Filters mentioning `addr`, or `None` if there are none.
    pub fn get(&self, addr: Ipv4Addr) -> Option<&[&'a TcFilter]> {
        self.map.get(&addr).map(Vec::as_slice)
    }
}

/// One direction's effective limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimit {
    #[default]
    Unlimited,
    /// Bytes per second, always positive.
    Limited(i64),
}

impl RateLimit {
    /// Limit from a class rate; non-positive rates are unlimited.
    pub fn from_bytes(rate: i64) -> Self {
        if rate > 0 {
            Self::Limited(rate)
        } else {
            Self::Unlimited
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str(UNLIMITED),
            Self::Limited(rate) => f.write_str(&format_rate(*rate)),
        }
    }
}

/// Download and upload limits for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rates {
    /// No classifier ID could be derived.
    Unavailable,
    Resolved {
        download: RateLimit,
        upload: RateLimit,
    },
}

impl Rates {
    /// Whether at least one direction is limited.
    pub fn is_limited(&self) -> bool {
        match self {
            Self::Unavailable => false,
            Self::Resolved { download, upload } => {
                !(download.is_unlimited() && upload.is_unlimited())
            }
        }
    }
}

impl fmt::Display for Rates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("N/A / N/A"),
            Self::Resolved { download, upload } => write!(f, "{download} / {upload}"),
        }
    }
}

/// Filter hit counter for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hits {
    /// Not looked up, or no filter mentions the subscriber.
    NotApplicable,
    Count(u64),
}

impl fmt::Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("-"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// A fully resolved report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub subscriber: Subscriber,
    pub classifier: Option<ClassifierId>,
    pub rates: Rates,
    pub hits: Hits,
}

/// Resolve one subscriber against the indexes.
///
/// Where several classes match in the same direction, the last one
/// processed wins.
pub fn resolve(
    subscriber: Subscriber,
    classifier: Option<ClassifierId>,
    classes: &ClassesByHash<'_>,
    filters: &FiltersByIp<'_>,
    upload_dev: &str,
) -> ResolvedRow {
    let Some(id) = classifier else {
        return ResolvedRow {
            subscriber,
            classifier: None,
            rates: Rates::Unavailable,
            hits: Hits::NotApplicable,
        };
    };

    let mut download = RateLimit::Unlimited;
    let mut upload = RateLimit::Unlimited;
    for class in classes.get(id.hash()) {
        let Some(rate) = class.rate else {
            continue;
        };
        if class.dev == upload_dev {
            upload = RateLimit::from_bytes(rate);
        } else {
            download = RateLimit::from_bytes(rate);
        }
    }
    let rates = Rates::Resolved { download, upload };

    let mut hits = Hits::NotApplicable;
    if rates.is_limited()
        && let Some(matched) = subscriber.addr.ipv4().and_then(|addr| filters.get(addr))
    {
        let count = matched
            .iter()
            .find_map(|filter| filter.success_count())
            .unwrap_or(0);
        hits = Hits::Count(count);
    }

    ResolvedRow {
        subscriber,
        classifier: Some(id),
        rates,
        hits,
    }
}

/// Resolve every subscriber in a snapshot.
///
/// With `active_only`, only members of the subscriber set are reported.
/// Subscribers whose address yields no classifier ID are still reported,
/// with unavailable rates.
pub fn correlate(snapshot: &Snapshot, upload_dev: &str, active_only: bool) -> Vec<ResolvedRow> {
    let classes = ClassesByHash::new(&snapshot.classes);
    let filters = FiltersByIp::new(&snapshot.filters);

    let mut seen: HashMap<u16, HostAddr> = HashMap::new();
    subscribers(snapshot)
        .into_iter()
        .filter(|sub| !active_only || sub.active)
        .map(|sub| {
            let id = ClassifierId::derive(&sub.addr.to_string());
            match &id {
                None => tracing::debug!(addr = %sub.addr, "no classifier for address"),
                Some(id) => match seen.get(&id.hash()) {
                    Some(other) => tracing::warn!(
                        addr = %sub.addr,
                        other = %other,
                        hash = id.hash(),
                        "classifier hash collision; subscribers span more than one /16"
                    ),
                    None => {
                        seen.insert(id.hash(), sub.addr.clone());
                    }
                },
            }
            resolve(sub, id, &classes, &filters, upload_dev)
        })
        .collect()
}

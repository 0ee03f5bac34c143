//! Kernel state collection.
//!
//! The [`Collector`] issues the external queries a report needs and
//! turns their output into records. Every query degrades to an empty
//! result when the command fails, times out or prints something that
//! cannot be parsed; a report must never abort because one source is
//! missing.
//!
//! Process invocation sits behind [`CommandRunner`] so the pipeline can
//! be driven from canned output.
//!
//! # Example
//!
//! ```ignore
//! use subshape::collector::{Collector, SystemRunner};
//! use subshape::config::Config;
//!
//! let config = Config::load("/etc/subshape.conf")?;
//! let collector = Collector::new(SystemRunner::new(config.timeout));
//! let snapshot = collector.snapshot(&config).await;
//! println!("{} classes", snapshot.classes.len());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::{Config, NftSet};
use crate::error::{Error, Result};
use crate::neigh::{HostAddr, NeighborEntry, parse_neighbors, parse_set_members};
use crate::tc::{TcClass, TcFilter, TcQdisc, parse_classes, parse_filters, parse_qdiscs};

/// Path to the `tc` command.
pub const TC_CMD: &str = "tc";
/// Path to the `ip` command.
pub const IP_CMD: &str = "ip";
/// Path to the `nft` command.
pub const NFT_CMD: &str = "nft";

/// Runs an external program and returns its standard output.
pub trait CommandRunner {
    /// Run `program` with `args`.
    ///
    /// Non-zero exit, spawn failure and timeouts are errors.
    fn run(&self, program: &str, args: &[&str]) -> impl Future<Output = Result<String>> + Send;
}

/// Render a command line for logs and errors.
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`CommandRunner`] that spawns real processes.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Create a runner that kills commands running longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let command = command_line(program, args);
        tracing::debug!(command = %command, "running query");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout {
                    command,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::trace!(command = %command, bytes = output.stdout.len(), "query succeeded");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Everything one report needs, captured at a single point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Members of the subscriber set.
    pub active: BTreeSet<Ipv4Addr>,
    /// Neighbor table, keyed by the address as printed.
    pub neighbors: BTreeMap<HostAddr, NeighborEntry>,
    pub classes: Vec<TcClass>,
    pub qdiscs: Vec<TcQdisc>,
    pub filters: Vec<TcFilter>,
}

/// Collects traffic-control and neighbor state through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct Collector<R> {
    runner: R,
}

impl<R: CommandRunner> Collector<R> {
    /// Create a collector.
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run a query; failures and blank output become `None`.
    async fn query(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.runner.run(program, args).await {
            Ok(out) if out.trim().is_empty() => {
                tracing::debug!(command = %command_line(program, args), "query returned no output");
                None
            }
            Ok(out) => Some(out),
            Err(e) if e.is_unavailable() => {
                tracing::warn!(
                    command = %command_line(program, args),
                    error = %e,
                    "query failed, treating as empty"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    command = %command_line(program, args),
                    error = %e,
                    "unexpected runner error, treating as empty"
                );
                None
            }
        }
    }

    /// Query each device in order and concatenate the parsed records.
    async fn per_device<T>(
        &self,
        devices: &[&str],
        args: impl Fn(&str) -> Vec<&str>,
        parse: impl Fn(&str, &str) -> Result<Vec<T>>,
    ) -> Vec<T> {
        let mut records = Vec::new();
        for &dev in devices {
            let Some(out) = self.query(TC_CMD, &args(dev)).await else {
                continue;
            };
            match parse(dev, &out) {
                Ok(parsed) => {
                    tracing::debug!(dev = %dev, count = parsed.len(), "parsed records");
                    records.extend(parsed);
                }
                Err(e) => tracing::warn!(dev = %dev, error = %e, "unparseable tc output"),
            }
        }
        records
    }

    /// Classes on each device, merged in device order.
    pub async fn classes(&self, devices: &[&str]) -> Vec<TcClass> {
        self.per_device(
            devices,
            |dev| vec!["-j", "class", "show", "dev", dev],
            parse_classes,
        )
        .await
    }

    /// Qdiscs on each device, merged in device order.
    pub async fn qdiscs(&self, devices: &[&str]) -> Vec<TcQdisc> {
        self.per_device(
            devices,
            |dev| vec!["-j", "qdisc", "show", "dev", dev],
            parse_qdiscs,
        )
        .await
    }

    /// Filters with statistics on each device, merged in device order.
    pub async fn filters(&self, devices: &[&str]) -> Vec<TcFilter> {
        self.per_device(
            devices,
            |dev| vec!["-s", "-p", "filter", "show", "dev", dev],
            |dev, out| Ok(parse_filters(dev, out)),
        )
        .await
    }

    /// Addresses in the subscriber set.
    pub async fn active_subscribers(&self, set: &NftSet) -> BTreeSet<Ipv4Addr> {
        let args = [
            "list",
            "set",
            set.family.as_str(),
            set.table.as_str(),
            set.set.as_str(),
        ];
        self.query(NFT_CMD, &args)
            .await
            .map(|out| parse_set_members(&out))
            .unwrap_or_default()
    }

    /// IPv4 neighbor table.
    pub async fn neighbors(&self) -> BTreeMap<HostAddr, NeighborEntry> {
        self.query(IP_CMD, &["neigh", "show"])
            .await
            .map(|out| parse_neighbors(&out))
            .unwrap_or_default()
    }

    /// Collect everything a report needs.
    ///
    /// Queries run one after another; devices are always visited
    /// download first, so record order is stable between runs.
    pub async fn snapshot(&self, config: &Config) -> Snapshot {
        let devices = config.devices();
        let snapshot = Snapshot {
            active: self.active_subscribers(&config.nft).await,
            neighbors: self.neighbors().await,
            classes: self.classes(&devices).await,
            qdiscs: self.qdiscs(&devices).await,
            filters: self.filters(&devices).await,
        };
        tracing::debug!(
            active = snapshot.active.len(),
            neighbors = snapshot.neighbors.len(),
            classes = snapshot.classes.len(),
            qdiscs = snapshot.qdiscs.len(),
            filters = snapshot.filters.len(),
            "collected snapshot"
        );
        snapshot
    }
}

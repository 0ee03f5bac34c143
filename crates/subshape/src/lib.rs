//! Per-subscriber traffic-control inspection for shared-link shapers.
//!
//! A shaper assigns every subscriber address an HTB class and a u32
//! hash filter whose identifiers are derived from the address itself.
//! This crate derives those identifiers, collects what the kernel is
//! actually applying on the download and upload (ifb) devices, and
//! correlates the two into one row per subscriber.
//!
//! # Example
//!
//! ```ignore
//! use subshape::collector::{Collector, SystemRunner};
//! use subshape::config::Config;
//! use subshape::correlate::correlate;
//! use subshape::output::{OutputFormat, OutputOptions, print_all};
//!
//! #[tokio::main]
//! async fn main() -> subshape::Result<()> {
//!     let config = Config::default();
//!     let collector = Collector::new(SystemRunner::new(config.timeout));
//!     let snapshot = collector.snapshot(&config).await;
//!
//!     let rows = correlate(&snapshot, &config.ifb_dev, false);
//!     print_all(&rows, OutputFormat::Text, &OutputOptions::default())?;
//!     Ok(())
//! }
//! ```
//!
//! # Address sampling
//!
//! ```
//! use subshape::classifier::ClassifierId;
//! use subshape::network::Network;
//!
//! let net: Network = "10.0.0.0/24".parse().unwrap();
//! let hosts = net.hosts(3).unwrap();
//! assert_eq!(hosts[0].to_string(), "10.0.0.2");
//!
//! let id = ClassifierId::from_addr(hosts[0]);
//! assert_eq!(id.classid(), "1:2");
//! ```

pub mod classifier;
pub mod collector;
pub mod config;
pub mod correlate;
pub mod error;
pub mod neigh;
pub mod network;
pub mod output;
pub mod parse;
pub mod rate;
pub mod tc;

pub use error::{Error, Result};

//! Subcommand implementations.

pub mod derive;
pub mod qdisc;
pub mod report;
pub mod sample;

use std::time::Duration;

use clap::Args;
use subshape::config::Config;

/// Overrides for the configuration file.
#[derive(Args, Debug, Default)]
pub struct DeviceArgs {
    /// Download-direction shaping device.
    #[arg(long, value_name = "DEV")]
    lan: Option<String>,

    /// Upload-direction (ifb) shaping device.
    #[arg(long, value_name = "DEV")]
    ifb: Option<String>,

    /// nftables family of the subscriber set.
    #[arg(long)]
    family: Option<String>,

    /// nftables table of the subscriber set.
    #[arg(long)]
    table: Option<String>,

    /// nftables set holding active subscribers.
    #[arg(long)]
    set: Option<String>,

    /// Timeout for each external query, in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl DeviceArgs {
    /// Apply the overrides on top of `config`.
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(dev) = self.lan {
            config.lan_dev = dev;
        }
        if let Some(dev) = self.ifb {
            config.ifb_dev = dev;
        }
        if let Some(family) = self.family {
            config.nft.family = family;
        }
        if let Some(table) = self.table {
            config.nft.table = table;
        }
        if let Some(set) = self.set {
            config.nft.set = set;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let args = DeviceArgs {
            ifb: Some("ifb3".into()),
            set: Some("active".into()),
            timeout: Some(1),
            ..Default::default()
        };
        let config = args.apply(Config::default());
        assert_eq!(config.devices(), ["eth0", "ifb3"]);
        assert_eq!(config.nft.set, "active");
        assert_eq!(config.nft.family, "inet");
        assert_eq!(config.timeout, Duration::from_secs(1));
    }
}

//! Shaper configuration.
//!
//! The shaper hosts keep their settings in a shell-style file of
//! `KEY="value"` lines, shared with the provisioning scripts:
//!
//! ```text
//! # downlink and uplink shaping devices
//! LAN_IF="eth1"
//! IFB_IF="ifb0"
//! NFT_SET=subscribers
//! ```
//!
//! Lines that are not assignments are ignored, as are keys this tool
//! does not use.

use std::path::Path;
use std::time::Duration;

use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::{Error, Result};
use crate::parse::PResult;

/// Default external command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The nftables set holding active subscriber addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftSet {
    pub family: String,
    pub table: String,
    pub set: String,
}

impl Default for NftSet {
    fn default() -> Self {
        Self {
            family: "inet".into(),
            table: "filter".into(),
            set: "subscribers".into(),
        }
    }
}

/// Settings for one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Download-direction shaping device.
    pub lan_dev: String,
    /// Upload-direction (ifb) shaping device.
    pub ifb_dev: String,
    pub nft: NftSet,
    /// Bound on each external query.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lan_dev: "eth0".into(),
            ifb_dev: "ifb0".into(),
            nft: NftSet::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `KEY="value"`, quotes optional.
fn assignment<'a>(input: &mut &'a str) -> PResult<(&'a str, &'a str)> {
    (
        take_while(1.., |c: char| c.is_ascii_uppercase() || c == '_'),
        "=",
        opt("\""),
        take_while(1.., |c: char| c != '"'),
        opt("\""),
    )
        .map(|(key, _, _, value, _)| (key, value))
        .parse_next(input)
}

/// Parse one line; `None` for comments, blanks and non-assignments.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let mut input = line.trim();
    if input.is_empty() || input.starts_with('#') {
        return None;
    }
    let pair = assignment(&mut input).ok()?;
    input.is_empty().then_some(pair)
}

impl Config {
    /// Parse configuration text on top of the defaults.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();
        for (idx, line) in text.lines().enumerate() {
            let Some((key, value)) = parse_line(line) else {
                continue;
            };
            match key {
                "LAN_IF" => config.lan_dev = value.to_string(),
                "IFB_IF" => config.ifb_dev = value.to_string(),
                "NFT_FAMILY" => config.nft.family = value.to_string(),
                "NFT_TABLE" => config.nft.table = value.to_string(),
                "NFT_SET" => config.nft.set = value.to_string(),
                "CMD_TIMEOUT" => {
                    let secs: u64 = value.trim().parse().map_err(|_| Error::Config {
                        line: idx + 1,
                        message: format!("CMD_TIMEOUT must be whole seconds, got {value:?}"),
                    })?;
                    config.timeout = Duration::from_secs(secs);
                }
                other => tracing::trace!(key = other, "ignoring config key"),
            }
        }
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::parse(&text)
    }

    /// Devices in query order: download, then upload.
    pub fn devices(&self) -> [&str; 2] {
        [self.lan_dev.as_str(), self.ifb_dev.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.devices(), ["eth0", "ifb0"]);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_parse_file() {
        let text = r#"
# shaper settings
LAN_IF="eth1"
IFB_IF=ifb1
NFT_FAMILY="ip"
NFT_TABLE="shaper"
NFT_SET="active"
CMD_TIMEOUT="2"
DB_HOST="127.0.0.1"
lower_case="ignored"
"#;
        let config = Config::parse(text).unwrap();
        assert_eq!(config.lan_dev, "eth1");
        assert_eq!(config.ifb_dev, "ifb1");
        assert_eq!(config.nft.family, "ip");
        assert_eq!(config.nft.table, "shaper");
        assert_eq!(config.nft.set, "active");
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_parse_line_shapes() {
        assert_eq!(parse_line("  LAN_IF=\"eth2\"  "), Some(("LAN_IF", "eth2")));
        assert_eq!(parse_line("LAN_IF=eth2\""), Some(("LAN_IF", "eth2")));
        assert_eq!(parse_line("LAN_IF=\"a\"b\""), None);
        assert_eq!(parse_line("LAN_IF="), None);
        assert_eq!(parse_line("# LAN_IF=eth9"), None);
        assert_eq!(parse_line("export LAN_IF=eth9"), None);
    }

    #[test]
    fn test_bad_timeout() {
        let err = Config::parse("LAN_IF=eth1\nCMD_TIMEOUT=soon\n").unwrap_err();
        match err {
            Error::Config { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("soon"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/subshape.conf").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

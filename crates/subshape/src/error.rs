//! Error types for subshape operations.

use std::io;

/// Result type for subshape operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting or deriving shaping state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from process spawning or file access.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// External command exited unsuccessfully.
    #[error("command `{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status code (-1 when killed by a signal).
        status: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// External command did not finish in time.
    #[error("command `{command}` timed out after {secs}s")]
    Timeout {
        /// The command line that was run.
        command: String,
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// Malformed `address/prefix` network.
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    /// Network too small for the requested number of hosts.
    #[error("not enough addresses: requested {requested}, network has {available}")]
    InsufficientAddresses {
        /// Number of hosts requested.
        requested: usize,
        /// Number of usable hosts found.
        available: usize,
    },

    /// Configuration file error.
    #[error("config line {line}: {message}")]
    Config {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
}

impl Error {
    /// Check if this error means external data was unavailable.
    ///
    /// Collectors swallow these and report empty results.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Json(_) | Self::CommandFailed { .. } | Self::Timeout { .. }
        )
    }

    /// Check if this is the insufficient-address-space outcome.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientAddresses { .. })
    }
}

//! Daemon configuration.

use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default directory under which the guest filesystem is mounted.
pub const DEFAULT_SYSROOT: &str = "/sysroot";

/// Settings for a [`HivexDaemon`](crate::HivexDaemon).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DaemonConfig {
    /// Host directory that guest paths are resolved against.
    pub sysroot: PathBuf,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            sysroot: PathBuf::from(DEFAULT_SYSROOT),
        }
    }
}

impl DaemonConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sysroot.
    pub fn with_sysroot(mut self, sysroot: impl AsRef<Path>) -> Self {
        self.sysroot = sysroot.as_ref().to_path_buf();
        self
    }

    /// Parses a JSON configuration document. Missing fields take defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

//! Mapping of guest filenames to host paths.

use crate::config::DaemonConfig;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Maps a guest-relative filename to an absolute host path.
pub trait PathResolver {
    /// Resolves `filename`.
    ///
    /// # Errors
    ///
    /// Fails if the name cannot be mapped under the guest root.
    fn resolve(&self, filename: &str) -> io::Result<PathBuf>;
}

/// Resolves guest paths beneath a fixed sysroot directory.
///
/// Leading slashes are ignored, so `/Windows/System32/config/SYSTEM` and
/// `Windows/System32/config/SYSTEM` resolve to the same host file. Names
/// that would climb out of the sysroot are rejected.
#[derive(Debug, Clone)]
pub struct SysrootResolver {
    sysroot: PathBuf,
}

impl SysrootResolver {
    /// Creates a resolver rooted at `sysroot`.
    pub fn new(sysroot: impl Into<PathBuf>) -> Self {
        Self {
            sysroot: sysroot.into(),
        }
    }

    /// Creates a resolver from the daemon configuration.
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self::new(config.sysroot.clone())
    }

    /// The host directory guest paths are resolved against.
    pub fn sysroot(&self) -> &Path {
        &self.sysroot
    }
}

impl PathResolver for SysrootResolver {
    fn resolve(&self, filename: &str) -> io::Result<PathBuf> {
        if filename.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty filename"));
        }

        let mut resolved = self.sysroot.clone();
        for component in Path::new(filename).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{}: path escapes the guest root", filename),
                    ));
                }
            }
        }

        debug!(filename, resolved = %resolved.display(), "Resolved guest path");
        Ok(resolved)
    }
}

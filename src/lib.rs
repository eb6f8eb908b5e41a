//! # Hive Session Adapter
//!
//! Exposes a registry hive editing engine as a set of request/reply
//! operations, the way a guest-inspection daemon serves them to its
//! library.
//!
//! ## Overview
//!
//! The engine (anything implementing [`HiveEngine`]) does the real work of
//! parsing and rewriting hive files. This crate sits between it and the
//! transport:
//!
//! 1. **Session**: one open hive per [`HivexDaemon`]. Opening again replaces
//!    the previous hive; every other operation fails until a hive is open.
//! 2. **Marshaling**: the engine's zero-terminated handle arrays become
//!    explicit-length lists ([`HandleList`]).
//! 3. **Optional arguments**: `hivex_open` takes `verbose`, `debug` and
//!    `write` together with a presence bitmask ([`OpenOptions`]).
//! 4. **Errors**: every failure is a [`SessionError`], reported on the wire
//!    as an [`ErrorReply`] carrying the operation name and a cause.
//!
//! ## Operations
//!
//! ```text
//! hivex_open            hivex_node_get_value
//! hivex_close           hivex_value_key
//! hivex_root            hivex_value_type
//! hivex_node_name       hivex_value_value
//! hivex_node_children   hivex_commit
//! hivex_node_get_child  hivex_node_add_child
//! hivex_node_parent     hivex_node_delete_child
//! hivex_node_values     hivex_node_set_value
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use hivex_session::{DaemonConfig, HiveEngine, HivexDaemon, OpenOptions};
//!
//! # fn run<E: HiveEngine>(engine: E) -> hivex_session::Result<()> {
//! let config = DaemonConfig::new().with_sysroot("/sysroot");
//! let mut daemon = HivexDaemon::from_config(engine, &config);
//!
//! daemon.open("/Windows/System32/config/SYSTEM", OpenOptions::new())?;
//! let root = daemon.root()?;
//! for child in daemon.node_children(root)?.iter() {
//!     println!("{}", daemon.node_name(*child)?);
//! }
//! daemon.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod handle;
pub mod marshal;
pub mod options;
pub mod resolver;
pub mod session;
pub mod value;
pub mod wire;

pub use config::DaemonConfig;
pub use daemon::{op, HivexDaemon, SharedDaemon};
pub use engine::{EngineHive, HiveEngine, UnavailableEngine};
pub use error::{Result, SessionError};
pub use handle::{Handle, Lookup, NodeHandle, RawHandle, ValueHandle};
pub use marshal::{HandleList, NodeList, SentinelArray, ValueList};
pub use options::{OpenFlags, OpenOptions, OptArgs};
pub use resolver::{PathResolver, SysrootResolver};
pub use session::SessionSlot;
pub use value::{ValueRecord, ValueType};
pub use wire::{ErrorReply, Reply, Request};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

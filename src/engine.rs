//! The hive engine seam.
//!
//! The engine parses and mutates the hive file; the adapter only drives it.
//! Engine calls keep the engine's native conventions: handles are raw
//! integers that may come back as zero, enumerations are zero-terminated
//! arrays, and failures are `io::Error`s (the engine's errno). The
//! dispatcher is responsible for turning those into wire shapes.

use crate::error::capability_violation;
use crate::handle::{Lookup, NodeHandle, RawHandle, ValueHandle};
use crate::marshal::SentinelArray;
use crate::options::OpenFlags;
use crate::value::{ValueRecord, ValueType};
use std::io;
use std::path::Path;

/// Factory for open hives.
pub trait HiveEngine {
    /// An open hive.
    type Hive: EngineHive;

    /// Whether this engine is compiled into the build.
    const AVAILABLE: bool = true;

    /// Opens the hive at `path`, an absolute host path.
    fn open(&mut self, path: &Path, flags: OpenFlags) -> io::Result<Self::Hive>;
}

/// Operations on one open hive.
///
/// Methods returning [`RawHandle`] may return zero; whether that is an error
/// is decided by the caller.
pub trait EngineHive {
    /// Releases the hive. Uncommitted changes are discarded.
    fn close(self) -> io::Result<()>;

    /// Returns the root node.
    fn root(&mut self) -> io::Result<RawHandle>;

    /// Returns the name of `node`.
    fn node_name(&mut self, node: NodeHandle) -> io::Result<String>;

    /// Returns the children of `node` as a zero-terminated array.
    fn node_children(&mut self, node: NodeHandle) -> io::Result<SentinelArray>;

    /// Looks up the child of `node` called `name`.
    fn node_get_child(&mut self, node: NodeHandle, name: &str) -> io::Result<Lookup<NodeHandle>>;

    /// Returns the parent of `node`.
    fn node_parent(&mut self, node: NodeHandle) -> io::Result<RawHandle>;

    /// Returns the values of `node` as a zero-terminated array.
    fn node_values(&mut self, node: NodeHandle) -> io::Result<SentinelArray>;

    /// Looks up the value of `node` called `key`.
    fn node_get_value(&mut self, node: NodeHandle, key: &str) -> io::Result<Lookup<ValueHandle>>;

    /// Returns the name of `value`.
    fn value_key(&mut self, value: ValueHandle) -> io::Result<String>;

    /// Returns the type of `value`.
    fn value_type(&mut self, value: ValueHandle) -> io::Result<ValueType>;

    /// Returns the raw payload of `value`.
    fn value_value(&mut self, value: ValueHandle) -> io::Result<Vec<u8>>;

    /// Writes pending changes, to `path` if given, otherwise to the file the
    /// hive was opened from.
    fn commit(&mut self, path: Option<&Path>) -> io::Result<()>;

    /// Creates a child of `parent` called `name`.
    fn node_add_child(&mut self, parent: NodeHandle, name: &str) -> io::Result<RawHandle>;

    /// Deletes `node` and everything below it.
    fn node_delete_child(&mut self, node: NodeHandle) -> io::Result<()>;

    /// Creates or replaces one value of `node`.
    fn node_set_value(&mut self, node: NodeHandle, value: &ValueRecord) -> io::Result<()>;
}

/// Engine stand-in for builds without hive support.
///
/// Its hive type has no values, so no session can ever exist; the
/// dispatcher refuses every operation before touching it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEngine;

/// Uninhabited hive type of [`UnavailableEngine`].
#[derive(Debug)]
pub enum UnavailableHive {}

impl HiveEngine for UnavailableEngine {
    type Hive = UnavailableHive;

    const AVAILABLE: bool = false;

    fn open(&mut self, _path: &Path, _flags: OpenFlags) -> io::Result<Self::Hive> {
        capability_violation("hivex_open")
    }
}

impl EngineHive for UnavailableHive {
    fn close(self) -> io::Result<()> {
        match self {}
    }

    fn root(&mut self) -> io::Result<RawHandle> {
        match *self {}
    }

    fn node_name(&mut self, _node: NodeHandle) -> io::Result<String> {
        match *self {}
    }

    fn node_children(&mut self, _node: NodeHandle) -> io::Result<SentinelArray> {
        match *self {}
    }

    fn node_get_child(&mut self, _node: NodeHandle, _name: &str) -> io::Result<Lookup<NodeHandle>> {
        match *self {}
    }

    fn node_parent(&mut self, _node: NodeHandle) -> io::Result<RawHandle> {
        match *self {}
    }

    fn node_values(&mut self, _node: NodeHandle) -> io::Result<SentinelArray> {
        match *self {}
    }

    fn node_get_value(&mut self, _node: NodeHandle, _key: &str) -> io::Result<Lookup<ValueHandle>> {
        match *self {}
    }

    fn value_key(&mut self, _value: ValueHandle) -> io::Result<String> {
        match *self {}
    }

    fn value_type(&mut self, _value: ValueHandle) -> io::Result<ValueType> {
        match *self {}
    }

    fn value_value(&mut self, _value: ValueHandle) -> io::Result<Vec<u8>> {
        match *self {}
    }

    fn commit(&mut self, _path: Option<&Path>) -> io::Result<()> {
        match *self {}
    }

    fn node_add_child(&mut self, _parent: NodeHandle, _name: &str) -> io::Result<RawHandle> {
        match *self {}
    }

    fn node_delete_child(&mut self, _node: NodeHandle) -> io::Result<()> {
        match *self {}
    }

    fn node_set_value(&mut self, _node: NodeHandle, _value: &ValueRecord) -> io::Result<()> {
        match *self {}
    }
}

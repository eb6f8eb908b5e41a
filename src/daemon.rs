//! The operation dispatcher.
//!
//! [`HivexDaemon`] owns the engine, the path resolver and the single session
//! slot. Each public method is one remotely invokable operation. Every
//! method except [`HivexDaemon::open`] refuses to run without an open
//! session and performs no engine call in that case.

use crate::config::DaemonConfig;
use crate::engine::{EngineHive, HiveEngine};
use crate::error::{capability_violation, Result, SessionError};
use crate::handle::{Lookup, NodeHandle, RawHandle, ValueHandle, SENTINEL};
use crate::marshal::{self, NodeList, ValueList};
use crate::options::OpenOptions;
use crate::resolver::{PathResolver, SysrootResolver};
use crate::session::SessionSlot;
use crate::value::{ValueRecord, ValueType};
use crate::wire::{self, ErrorReply, Reply, Request};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Wire names of the operations.
#[allow(missing_docs)]
pub mod op {
    pub const OPEN: &str = "hivex_open";
    pub const CLOSE: &str = "hivex_close";
    pub const ROOT: &str = "hivex_root";
    pub const NODE_NAME: &str = "hivex_node_name";
    pub const NODE_CHILDREN: &str = "hivex_node_children";
    pub const NODE_GET_CHILD: &str = "hivex_node_get_child";
    pub const NODE_PARENT: &str = "hivex_node_parent";
    pub const NODE_VALUES: &str = "hivex_node_values";
    pub const NODE_GET_VALUE: &str = "hivex_node_get_value";
    pub const VALUE_KEY: &str = "hivex_value_key";
    pub const VALUE_TYPE: &str = "hivex_value_type";
    pub const VALUE_VALUE: &str = "hivex_value_value";
    pub const COMMIT: &str = "hivex_commit";
    pub const NODE_ADD_CHILD: &str = "hivex_node_add_child";
    pub const NODE_DELETE_CHILD: &str = "hivex_node_delete_child";
    pub const NODE_SET_VALUE: &str = "hivex_node_set_value";
}

fn failed(op: &'static str, source: io::Error) -> SessionError {
    warn!(op, error = %source, "Hive engine call failed");
    SessionError::engine(op, "failed", source)
}

fn non_null(op: &'static str, raw: RawHandle) -> Result<RawHandle> {
    if raw == SENTINEL {
        warn!(op, "Hive engine returned the null handle");
        return Err(SessionError::null_handle(op));
    }
    Ok(raw)
}

fn malloc_failed(op: &'static str, source: io::Error) -> SessionError {
    SessionError::resource(op, "malloc", source)
}

/// Session adapter around one hive engine.
pub struct HivexDaemon<E: HiveEngine, R: PathResolver = SysrootResolver> {
    engine: E,
    resolver: R,
    session: SessionSlot<E::Hive>,
}

impl<E: HiveEngine> HivexDaemon<E, SysrootResolver> {
    /// Creates a daemon resolving guest paths under the configured sysroot.
    pub fn from_config(engine: E, config: &DaemonConfig) -> Self {
        Self::new(engine, SysrootResolver::from_config(config))
    }
}

impl<E: HiveEngine, R: PathResolver> HivexDaemon<E, R> {
    /// Creates a daemon with no open session.
    pub fn new(engine: E, resolver: R) -> Self {
        Self {
            engine,
            resolver,
            session: SessionSlot::new(),
        }
    }

    /// Reports whether the hive engine is compiled into this build.
    ///
    /// When this is false the dispatch layer must not route any hive
    /// operation here.
    pub fn available() -> bool {
        E::AVAILABLE
    }

    /// Returns true if a hive is currently open.
    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Returns the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the path resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    fn ensure_available(op: &'static str) {
        if !E::AVAILABLE {
            capability_violation(op);
        }
    }

    /// Availability check followed by the open-session gate.
    fn hive(&mut self, op: &'static str) -> Result<&mut E::Hive> {
        Self::ensure_available(op);
        self.session.require(op)
    }

    /// Opens `filename`, replacing any open session.
    ///
    /// The previous session is closed before anything else happens, so a
    /// failed open leaves no session at all.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Resource`] if the name cannot be resolved and
    /// [`SessionError::Engine`] if the engine cannot open the file.
    #[instrument(skip(self, options), fields(flags = ?options.engine_flags()))]
    pub fn open(&mut self, filename: &str, options: OpenOptions) -> Result<()> {
        Self::ensure_available(op::OPEN);

        if self.session.close() {
            info!("Closed previous hive before reopening");
        }

        let path = self
            .resolver
            .resolve(filename)
            .map_err(|e| SessionError::resource(op::OPEN, "resolve", e))?;

        let hive = self
            .engine
            .open(&path, options.engine_flags())
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "Hive engine could not open file");
                SessionError::engine(op::OPEN, format!("hivex failed to open {}", filename), e)
            })?;

        self.session.install(hive);
        info!(path = %path.display(), "Opened hive");
        Ok(())
    }

    /// Closes the open hive. Uncommitted changes are discarded.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<()> {
        self.hive(op::CLOSE)?;
        self.session.close();
        info!("Closed hive");
        Ok(())
    }

    /// Returns the root node.
    #[instrument(skip(self))]
    pub fn root(&mut self) -> Result<NodeHandle> {
        let hive = self.hive(op::ROOT)?;
        let raw = hive.root().map_err(|e| failed(op::ROOT, e))?;
        non_null(op::ROOT, raw).map(NodeHandle)
    }

    /// Returns the name of a node.
    #[instrument(skip(self))]
    pub fn node_name(&mut self, node: NodeHandle) -> Result<String> {
        let hive = self.hive(op::NODE_NAME)?;
        hive.node_name(node).map_err(|e| failed(op::NODE_NAME, e))
    }

    /// Lists the children of a node. An empty list is a valid answer.
    #[instrument(skip(self))]
    pub fn node_children(&mut self, node: NodeHandle) -> Result<NodeList> {
        let hive = self.hive(op::NODE_CHILDREN)?;
        let array = hive
            .node_children(node)
            .map_err(|e| failed(op::NODE_CHILDREN, e))?;
        let list: NodeList =
            marshal::to_list(array).map_err(|e| malloc_failed(op::NODE_CHILDREN, e))?;
        debug!(count = list.len(), "Listed child nodes");
        Ok(list)
    }

    /// Looks up a child by name.
    ///
    /// A missing child is `Ok(Lookup::NotFound)`, not an error.
    #[instrument(skip(self))]
    pub fn node_get_child(&mut self, node: NodeHandle, name: &str) -> Result<Lookup<NodeHandle>> {
        let hive = self.hive(op::NODE_GET_CHILD)?;
        let lookup = hive
            .node_get_child(node, name)
            .map_err(|e| failed(op::NODE_GET_CHILD, e))?;
        debug!(found = lookup.is_found(), "Child lookup finished");
        Ok(lookup)
    }

    /// Returns the parent of a node.
    #[instrument(skip(self))]
    pub fn node_parent(&mut self, node: NodeHandle) -> Result<NodeHandle> {
        let hive = self.hive(op::NODE_PARENT)?;
        let raw = hive.node_parent(node).map_err(|e| failed(op::NODE_PARENT, e))?;
        non_null(op::NODE_PARENT, raw).map(NodeHandle)
    }

    /// Lists the values of a node. An empty list is a valid answer.
    #[instrument(skip(self))]
    pub fn node_values(&mut self, node: NodeHandle) -> Result<ValueList> {
        let hive = self.hive(op::NODE_VALUES)?;
        let array = hive
            .node_values(node)
            .map_err(|e| failed(op::NODE_VALUES, e))?;
        let list: ValueList =
            marshal::to_list(array).map_err(|e| malloc_failed(op::NODE_VALUES, e))?;
        debug!(count = list.len(), "Listed values");
        Ok(list)
    }

    /// Looks up a value by key. A missing value is `Ok(Lookup::NotFound)`.
    #[instrument(skip(self))]
    pub fn node_get_value(&mut self, node: NodeHandle, key: &str) -> Result<Lookup<ValueHandle>> {
        let hive = self.hive(op::NODE_GET_VALUE)?;
        let lookup = hive
            .node_get_value(node, key)
            .map_err(|e| failed(op::NODE_GET_VALUE, e))?;
        debug!(found = lookup.is_found(), "Value lookup finished");
        Ok(lookup)
    }

    /// Returns the key (name) of a value.
    #[instrument(skip(self))]
    pub fn value_key(&mut self, value: ValueHandle) -> Result<String> {
        let hive = self.hive(op::VALUE_KEY)?;
        hive.value_key(value).map_err(|e| failed(op::VALUE_KEY, e))
    }

    /// Returns the type of a value.
    #[instrument(skip(self))]
    pub fn value_type(&mut self, value: ValueHandle) -> Result<ValueType> {
        let hive = self.hive(op::VALUE_TYPE)?;
        hive.value_type(value).map_err(|e| failed(op::VALUE_TYPE, e))
    }

    /// Returns the raw payload of a value.
    #[instrument(skip(self))]
    pub fn value_value(&mut self, value: ValueHandle) -> Result<Vec<u8>> {
        let hive = self.hive(op::VALUE_VALUE)?;
        let payload = hive.value_value(value).map_err(|e| failed(op::VALUE_VALUE, e))?;
        debug!(size = payload.len(), "Read value payload");
        Ok(payload)
    }

    /// Writes pending changes.
    ///
    /// An empty `filename` writes back to the file the hive was opened
    /// from; otherwise `filename` is handed to the engine unchanged.
    #[instrument(skip(self))]
    pub fn commit(&mut self, filename: &str) -> Result<()> {
        let hive = self.hive(op::COMMIT)?;
        let target = (!filename.is_empty()).then(|| Path::new(filename));
        hive.commit(target).map_err(|e| failed(op::COMMIT, e))?;
        info!(destination = ?target, "Committed hive");
        Ok(())
    }

    /// Creates a child node and returns its handle.
    #[instrument(skip(self))]
    pub fn node_add_child(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle> {
        let hive = self.hive(op::NODE_ADD_CHILD)?;
        let raw = hive
            .node_add_child(parent, name)
            .map_err(|e| failed(op::NODE_ADD_CHILD, e))?;
        let child = non_null(op::NODE_ADD_CHILD, raw).map(NodeHandle)?;
        debug!(child = %child, "Added child node");
        Ok(child)
    }

    /// Deletes a node and its whole subtree.
    #[instrument(skip(self))]
    pub fn node_delete_child(&mut self, node: NodeHandle) -> Result<()> {
        let hive = self.hive(op::NODE_DELETE_CHILD)?;
        hive.node_delete_child(node)
            .map_err(|e| failed(op::NODE_DELETE_CHILD, e))
    }

    /// Creates or overwrites one value of a node.
    ///
    /// Neither the type code nor the payload is checked here; the record
    /// reaches the engine as given.
    #[instrument(skip(self, payload), fields(size = payload.len()))]
    pub fn node_set_value(
        &mut self,
        node: NodeHandle,
        key: &str,
        type_code: i64,
        payload: Vec<u8>,
    ) -> Result<()> {
        let hive = self.hive(op::NODE_SET_VALUE)?;
        let record = ValueRecord::new(key, type_code, payload);
        debug!(type_code, payload = %record.preview(), "Setting value");
        hive.node_set_value(node, &record)
            .map_err(|e| failed(op::NODE_SET_VALUE, e))
    }

    /// Routes a wire request to its operation.
    pub fn dispatch(&mut self, request: Request) -> std::result::Result<Reply, ErrorReply> {
        wire::dispatch(self, request)
    }

    /// Releases the open hive, if any. Called by the host's shutdown
    /// sequence; also run when the daemon is dropped.
    pub fn finalize(&mut self) {
        if self.session.close() {
            info!("Released hive during shutdown");
        }
    }
}

impl<E: HiveEngine, R: PathResolver> Drop for HivexDaemon<E, R> {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// A daemon shared between threads.
///
/// All access goes through one mutex, which serializes session replacement,
/// closing and use.
pub struct SharedDaemon<E: HiveEngine, R: PathResolver = SysrootResolver> {
    inner: Arc<Mutex<HivexDaemon<E, R>>>,
}

impl<E: HiveEngine, R: PathResolver> Clone for SharedDaemon<E, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: HiveEngine, R: PathResolver> SharedDaemon<E, R> {
    /// Wraps a daemon.
    pub fn new(daemon: HivexDaemon<E, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(daemon)),
        }
    }

    /// Runs `f` with exclusive access to the daemon.
    pub fn with<T>(&self, f: impl FnOnce(&mut HivexDaemon<E, R>) -> T) -> T {
        // A panic inside `f` cannot leave the session slot half-updated.
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Routes a wire request under the lock.
    pub fn dispatch(&self, request: Request) -> std::result::Result<Reply, ErrorReply> {
        self.with(|daemon| daemon.dispatch(request))
    }

    /// Runs the teardown hook under the lock.
    pub fn finalize(&self) {
        self.with(|daemon| daemon.finalize());
    }
}

//! Recording in-memory hive engine shared by the integration tests.

#![allow(dead_code)]

use hivex_session::{
    EngineHive, HiveEngine, HivexDaemon, Lookup, NodeHandle, OpenFlags, RawHandle,
    SentinelArray, SysrootResolver, ValueHandle, ValueRecord, ValueType,
};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything the engine observed, shared between the test and the engine.
#[derive(Debug, Default)]
pub struct EngineLog {
    /// Names of every engine call, in order.
    pub calls: Vec<String>,
    /// Paths and flags passed to `open`.
    pub opened: Vec<(PathBuf, OpenFlags)>,
    /// Paths of hives that were closed.
    pub closed: Vec<PathBuf>,
    /// Targets passed to `commit`.
    pub committed: Vec<Option<PathBuf>>,
    /// When set, `root` returns zero without an error.
    pub null_root: bool,
    /// When set, lists come back from the engine without a terminator.
    pub unterminated_lists: bool,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: RawHandle,
    children: Vec<RawHandle>,
    values: Vec<RawHandle>,
}

#[derive(Debug, Clone)]
struct Value {
    key: String,
    value_type: ValueType,
    payload: Vec<u8>,
}

/// Engine that serves small in-memory hives.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, EngineLog> {
        self.log.lock().unwrap()
    }

    pub fn call_count(&self) -> usize {
        self.log().calls.len()
    }
}

impl HiveEngine for MockEngine {
    type Hive = MockHive;

    fn open(&mut self, path: &Path, flags: OpenFlags) -> io::Result<MockHive> {
        {
            let mut log = self.log();
            log.calls.push("open".into());
            log.opened.push((path.to_path_buf(), flags));
        }

        if path.file_name().map_or(true, |name| name == "missing") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"));
        }
        if path.file_name().map_or(false, |name| name == "corrupt") {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Not a registry hive"));
        }

        Ok(MockHive::system(path, flags, Arc::clone(&self.log)))
    }
}

/// One open in-memory hive.
#[derive(Debug)]
pub struct MockHive {
    path: PathBuf,
    flags: OpenFlags,
    root: RawHandle,
    next: RawHandle,
    nodes: BTreeMap<RawHandle, Node>,
    values: BTreeMap<RawHandle, Value>,
    log: Arc<Mutex<EngineLog>>,
}

pub const ROOT: RawHandle = 0x1020;
pub const CONTROL_SET: RawHandle = 0x1040;
pub const SELECT: RawHandle = 0x1060;
pub const CURRENT: RawHandle = 0x1080;

impl MockHive {
    /// A tiny SYSTEM hive: `ROOT\{ControlSet001, Select}`, with one DWORD
    /// value `Current` on `Select`.
    fn system(path: &Path, flags: OpenFlags, log: Arc<Mutex<EngineLog>>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            ROOT,
            Node {
                name: "ROOT".into(),
                parent: 0,
                children: vec![CONTROL_SET, SELECT],
                values: vec![],
            },
        );
        nodes.insert(
            CONTROL_SET,
            Node {
                name: "ControlSet001".into(),
                parent: ROOT,
                children: vec![],
                values: vec![],
            },
        );
        nodes.insert(
            SELECT,
            Node {
                name: "Select".into(),
                parent: ROOT,
                children: vec![],
                values: vec![CURRENT],
            },
        );

        let mut values = BTreeMap::new();
        values.insert(
            CURRENT,
            Value {
                key: "Current".into(),
                value_type: ValueType::Dword,
                payload: vec![1, 0, 0, 0],
            },
        );

        Self {
            path: path.to_path_buf(),
            flags,
            root: ROOT,
            next: 0x2000,
            nodes,
            values,
            log,
        }
    }

    fn record(&self, call: &str) {
        self.log.lock().unwrap().calls.push(call.into());
    }

    fn node(&self, node: NodeHandle) -> io::Result<&Node> {
        self.nodes.get(&node.0).ok_or_else(invalid_handle)
    }

    fn value(&self, value: ValueHandle) -> io::Result<&Value> {
        self.values.get(&value.0).ok_or_else(invalid_handle)
    }

    fn list(&self, handles: &[RawHandle]) -> SentinelArray {
        if self.log.lock().unwrap().unterminated_lists {
            SentinelArray::from_raw(handles.to_vec())
        } else {
            SentinelArray::terminated(handles.iter().copied())
        }
    }

    fn require_write(&self) -> io::Result<()> {
        if self.flags.contains(OpenFlags::WRITE) {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "Read-only file system"))
        }
    }

    fn allocate(&mut self) -> RawHandle {
        let handle = self.next;
        self.next += 0x20;
        handle
    }
}

fn invalid_handle() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "Invalid argument")
}

impl EngineHive for MockHive {
    fn close(self) -> io::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push("close".into());
        log.closed.push(self.path.clone());
        Ok(())
    }

    fn root(&mut self) -> io::Result<RawHandle> {
        self.record("root");
        if self.log.lock().unwrap().null_root {
            return Ok(0);
        }
        Ok(self.root)
    }

    fn node_name(&mut self, node: NodeHandle) -> io::Result<String> {
        self.record("node_name");
        Ok(self.node(node)?.name.clone())
    }

    fn node_children(&mut self, node: NodeHandle) -> io::Result<SentinelArray> {
        self.record("node_children");
        let children = self.node(node)?.children.clone();
        Ok(self.list(&children))
    }

    fn node_get_child(&mut self, node: NodeHandle, name: &str) -> io::Result<Lookup<NodeHandle>> {
        self.record("node_get_child");
        let parent = self.node(node)?;
        let found = parent
            .children
            .iter()
            .copied()
            .find(|h| self.nodes[h].name.eq_ignore_ascii_case(name));
        Ok(Lookup::from_raw(found.unwrap_or(0)))
    }

    fn node_parent(&mut self, node: NodeHandle) -> io::Result<RawHandle> {
        self.record("node_parent");
        let parent = self.node(node)?.parent;
        if parent == 0 {
            // The root has no parent.
            return Err(invalid_handle());
        }
        Ok(parent)
    }

    fn node_values(&mut self, node: NodeHandle) -> io::Result<SentinelArray> {
        self.record("node_values");
        let values = self.node(node)?.values.clone();
        Ok(self.list(&values))
    }

    fn node_get_value(&mut self, node: NodeHandle, key: &str) -> io::Result<Lookup<ValueHandle>> {
        self.record("node_get_value");
        let owner = self.node(node)?;
        let found = owner
            .values
            .iter()
            .copied()
            .find(|h| self.values[h].key.eq_ignore_ascii_case(key));
        Ok(Lookup::from_raw(found.unwrap_or(0)))
    }

    fn value_key(&mut self, value: ValueHandle) -> io::Result<String> {
        self.record("value_key");
        Ok(self.value(value)?.key.clone())
    }

    fn value_type(&mut self, value: ValueHandle) -> io::Result<ValueType> {
        self.record("value_type");
        Ok(self.value(value)?.value_type)
    }

    fn value_value(&mut self, value: ValueHandle) -> io::Result<Vec<u8>> {
        self.record("value_value");
        Ok(self.value(value)?.payload.clone())
    }

    fn commit(&mut self, path: Option<&Path>) -> io::Result<()> {
        self.record("commit");
        self.require_write()?;
        self.log
            .lock()
            .unwrap()
            .committed
            .push(path.map(Path::to_path_buf));
        Ok(())
    }

    fn node_add_child(&mut self, parent: NodeHandle, name: &str) -> io::Result<RawHandle> {
        self.record("node_add_child");
        self.require_write()?;
        self.node(parent)?;
        let child = self.allocate();
        self.nodes.insert(
            child,
            Node {
                name: name.into(),
                parent: parent.0,
                children: vec![],
                values: vec![],
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent.0) {
            p.children.push(child);
        }
        Ok(child)
    }

    fn node_delete_child(&mut self, node: NodeHandle) -> io::Result<()> {
        self.record("node_delete_child");
        self.require_write()?;
        let parent = self.node(node)?.parent;
        if parent == 0 {
            return Err(invalid_handle());
        }
        let mut pending = vec![node.0];
        while let Some(h) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&h) {
                pending.extend(removed.children);
                for v in removed.values {
                    self.values.remove(&v);
                }
            }
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|&c| c != node.0);
        }
        Ok(())
    }

    fn node_set_value(&mut self, node: NodeHandle, value: &ValueRecord) -> io::Result<()> {
        self.record("node_set_value");
        self.require_write()?;
        let value_type = u32::try_from(value.type_code)
            .map(ValueType::from_code)
            .map_err(|_| invalid_handle())?;
        let existing = self
            .node(node)?
            .values
            .iter()
            .copied()
            .find(|h| self.values[h].key == value.key);
        let handle = match existing {
            Some(h) => h,
            None => {
                let h = self.allocate();
                if let Some(n) = self.nodes.get_mut(&node.0) {
                    n.values.push(h);
                }
                h
            }
        };
        self.values.insert(
            handle,
            Value {
                key: value.key.clone(),
                value_type,
                payload: value.payload.clone(),
            },
        );
        Ok(())
    }
}

/// A daemon over a fresh mock engine, resolving under `/sysroot`.
pub fn daemon() -> (HivexDaemon<MockEngine>, MockEngine) {
    let engine = MockEngine::new();
    let daemon = HivexDaemon::new(engine.clone(), SysrootResolver::new("/sysroot"));
    (daemon, engine)
}

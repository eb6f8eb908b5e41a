//! Request and reply shapes exchanged with the transport.
//!
//! The transport itself (framing, encoding) lives elsewhere. This module
//! defines what a request carries, what a successful reply carries, and the
//! uniform [`ErrorReply`] every failure turns into. With the `serde`
//! feature these types can be encoded as JSON.

use crate::daemon::{op, HivexDaemon};
use crate::engine::HiveEngine;
use crate::error::SessionError;
use crate::handle::{NodeHandle, ValueHandle};
use crate::marshal::{NodeList, ValueList};
use crate::options::OpenOptions;
use crate::resolver::PathResolver;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One operation invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(tag = "op"))]
pub enum Request {
    /// `hivex_open`. `optargs_bitmask` marks which optional arguments were
    /// supplied (bit 0 verbose, bit 1 debug, bit 2 write).
    #[cfg_attr(feature = "serde", serde(rename = "hivex_open"))]
    Open {
        /// Guest path of the hive file.
        filename: String,
        /// Which of the optional arguments below were supplied.
        #[cfg_attr(feature = "serde", serde(default))]
        optargs_bitmask: u64,
        /// Optional `verbose`.
        #[cfg_attr(feature = "serde", serde(default))]
        verbose: bool,
        /// Optional `debug`.
        #[cfg_attr(feature = "serde", serde(default))]
        debug: bool,
        /// Optional `write`.
        #[cfg_attr(feature = "serde", serde(default))]
        write: bool,
    },
    /// `hivex_close`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_close"))]
    Close,
    /// `hivex_root`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_root"))]
    Root,
    /// `hivex_node_name`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_name"))]
    NodeName {
        /// Node to name.
        nodeh: NodeHandle,
    },
    /// `hivex_node_children`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_children"))]
    NodeChildren {
        /// Node whose children are listed.
        nodeh: NodeHandle,
    },
    /// `hivex_node_get_child`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_get_child"))]
    NodeGetChild {
        /// Parent node.
        nodeh: NodeHandle,
        /// Child name.
        name: String,
    },
    /// `hivex_node_parent`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_parent"))]
    NodeParent {
        /// Child node.
        nodeh: NodeHandle,
    },
    /// `hivex_node_values`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_values"))]
    NodeValues {
        /// Node whose values are listed.
        nodeh: NodeHandle,
    },
    /// `hivex_node_get_value`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_get_value"))]
    NodeGetValue {
        /// Owning node.
        nodeh: NodeHandle,
        /// Value name.
        key: String,
    },
    /// `hivex_value_key`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_value_key"))]
    ValueKey {
        /// Value to name.
        valueh: ValueHandle,
    },
    /// `hivex_value_type`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_value_type"))]
    ValueType {
        /// Value to inspect.
        valueh: ValueHandle,
    },
    /// `hivex_value_value`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_value_value"))]
    ValueValue {
        /// Value to read.
        valueh: ValueHandle,
    },
    /// `hivex_commit`. An empty filename commits to the original file.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_commit"))]
    Commit {
        /// Destination, passed to the engine as is.
        #[cfg_attr(feature = "serde", serde(default))]
        filename: String,
    },
    /// `hivex_node_add_child`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_add_child"))]
    NodeAddChild {
        /// Node to add under.
        parent: NodeHandle,
        /// Name of the new node.
        name: String,
    },
    /// `hivex_node_delete_child`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_delete_child"))]
    NodeDeleteChild {
        /// Node to delete with its subtree.
        nodeh: NodeHandle,
    },
    /// `hivex_node_set_value`.
    #[cfg_attr(feature = "serde", serde(rename = "hivex_node_set_value"))]
    NodeSetValue {
        /// Owning node.
        nodeh: NodeHandle,
        /// Value name.
        key: String,
        /// Type code, not validated by the adapter.
        t: i64,
        /// Payload.
        val: Vec<u8>,
    },
}

impl Request {
    /// Wire name of the requested operation.
    pub fn operation(&self) -> &'static str {
        match self {
            Request::Open { .. } => op::OPEN,
            Request::Close => op::CLOSE,
            Request::Root => op::ROOT,
            Request::NodeName { .. } => op::NODE_NAME,
            Request::NodeChildren { .. } => op::NODE_CHILDREN,
            Request::NodeGetChild { .. } => op::NODE_GET_CHILD,
            Request::NodeParent { .. } => op::NODE_PARENT,
            Request::NodeValues { .. } => op::NODE_VALUES,
            Request::NodeGetValue { .. } => op::NODE_GET_VALUE,
            Request::ValueKey { .. } => op::VALUE_KEY,
            Request::ValueType { .. } => op::VALUE_TYPE,
            Request::ValueValue { .. } => op::VALUE_VALUE,
            Request::Commit { .. } => op::COMMIT,
            Request::NodeAddChild { .. } => op::NODE_ADD_CHILD,
            Request::NodeDeleteChild { .. } => op::NODE_DELETE_CHILD,
            Request::NodeSetValue { .. } => op::NODE_SET_VALUE,
        }
    }

    /// Decodes a request from JSON.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Successful result of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Reply {
    /// No result (open, close, commit, delete, set-value).
    Unit,
    /// A node handle. For `hivex_node_get_child` zero means "no such child".
    Node(NodeHandle),
    /// A value handle. For `hivex_node_get_value` zero means "no such value".
    Value(ValueHandle),
    /// Child nodes.
    Nodes(NodeList),
    /// Values of a node.
    Values(ValueList),
    /// A name.
    Text(String),
    /// An integer (value type code).
    Int(i64),
    /// A value payload.
    Bytes(Vec<u8>),
}

impl Reply {
    /// Encodes the reply as JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// The uniform failure reply.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorReply {
    /// Wire name of the failed operation.
    pub operation: String,
    /// Human-readable cause.
    pub message: String,
}

impl From<SessionError> for ErrorReply {
    fn from(err: SessionError) -> Self {
        Self {
            operation: err.operation().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorReply {}

/// Routes `request` to the matching operation of `daemon`.
pub fn dispatch<E, R>(daemon: &mut HivexDaemon<E, R>, request: Request) -> Result<Reply, ErrorReply>
where
    E: HiveEngine,
    R: PathResolver,
{
    let reply = match request {
        Request::Open {
            filename,
            optargs_bitmask,
            verbose,
            debug,
            write,
        } => {
            let options = OpenOptions::from_wire(optargs_bitmask, verbose, debug, write);
            daemon.open(&filename, options).map(|()| Reply::Unit)
        }
        Request::Close => daemon.close().map(|()| Reply::Unit),
        Request::Root => daemon.root().map(Reply::Node),
        Request::NodeName { nodeh } => daemon.node_name(nodeh).map(Reply::Text),
        Request::NodeChildren { nodeh } => daemon.node_children(nodeh).map(Reply::Nodes),
        Request::NodeGetChild { nodeh, name } => daemon
            .node_get_child(nodeh, &name)
            .map(|lookup| Reply::Node(lookup.handle_or_sentinel())),
        Request::NodeParent { nodeh } => daemon.node_parent(nodeh).map(Reply::Node),
        Request::NodeValues { nodeh } => daemon.node_values(nodeh).map(Reply::Values),
        Request::NodeGetValue { nodeh, key } => daemon
            .node_get_value(nodeh, &key)
            .map(|lookup| Reply::Value(lookup.handle_or_sentinel())),
        Request::ValueKey { valueh } => daemon.value_key(valueh).map(Reply::Text),
        Request::ValueType { valueh } => daemon
            .value_type(valueh)
            .map(|t| Reply::Int(i64::from(t.code()))),
        Request::ValueValue { valueh } => daemon.value_value(valueh).map(Reply::Bytes),
        Request::Commit { filename } => daemon.commit(&filename).map(|()| Reply::Unit),
        Request::NodeAddChild { parent, name } => {
            daemon.node_add_child(parent, &name).map(Reply::Node)
        }
        Request::NodeDeleteChild { nodeh } => {
            daemon.node_delete_child(nodeh).map(|()| Reply::Unit)
        }
        Request::NodeSetValue { nodeh, key, t, val } => daemon
            .node_set_value(nodeh, &key, t, val)
            .map(|()| Reply::Unit),
    };

    reply.map_err(ErrorReply::from)
}

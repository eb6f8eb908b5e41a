//! Opaque node and value handles.
//!
//! Handles are engine-assigned integers that are only meaningful within the
//! session that produced them. Zero is reserved: it terminates handle arrays
//! and marks "no handle".

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw integer form of a handle, as exchanged with the engine and the wire.
pub type RawHandle = i64;

/// The reserved sentinel handle value.
pub const SENTINEL: RawHandle = 0;

/// Common behaviour of [`NodeHandle`] and [`ValueHandle`].
pub trait Handle: Copy + Eq + fmt::Debug {
    /// Wraps a raw engine value.
    fn from_raw(raw: RawHandle) -> Self;

    /// Returns the raw engine value.
    fn raw(self) -> RawHandle;

    /// Returns true if this is the sentinel handle.
    fn is_sentinel(self) -> bool {
        self.raw() == SENTINEL
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(pub RawHandle);

        impl $name {
            /// The sentinel handle ("no such entry").
            pub const SENTINEL: Self = Self(SENTINEL);
        }

        impl Handle for $name {
            fn from_raw(raw: RawHandle) -> Self {
                Self(raw)
            }

            fn raw(self) -> RawHandle {
                self.0
            }
        }

        impl From<RawHandle> for $name {
            fn from(raw: RawHandle) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{:#x}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle of a registry key (node) in the open hive.
    NodeHandle,
    "node"
);

define_handle!(
    /// Handle of a named value attached to a node.
    ValueHandle,
    "value"
);

/// Outcome of a by-name lookup that completed without an engine error.
///
/// The engine answers "no such child" and "the call failed" with the same
/// zero handle; the failing case is carried separately as `Err`, so a
/// `Lookup` only ever distinguishes found from missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<H> {
    /// The entry exists.
    Found(H),
    /// The entry does not exist.
    NotFound,
}

impl<H: Handle> Lookup<H> {
    /// Builds a lookup from a raw engine result that was not flagged as an
    /// error. Zero means the entry does not exist.
    pub fn from_raw(raw: RawHandle) -> Self {
        if raw == SENTINEL {
            Lookup::NotFound
        } else {
            Lookup::Found(H::from_raw(raw))
        }
    }

    /// Returns the found handle, or the sentinel handle for a miss.
    pub fn handle_or_sentinel(self) -> H {
        match self {
            Lookup::Found(h) => h,
            Lookup::NotFound => H::from_raw(SENTINEL),
        }
    }

    /// Returns true if the entry was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

//! Conversion of engine handle arrays into wire lists.
//!
//! The engine enumerates children and values as arrays terminated by a zero
//! handle. On the wire a list is an explicit length plus a dense array with
//! no terminator.

use crate::handle::{Handle, NodeHandle, RawHandle, ValueHandle, SENTINEL};
use std::io;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A zero-terminated handle array as produced by the engine.
///
/// The terminator is not a member. Entries after the first zero are
/// ignored; an array without any zero is taken whole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SentinelArray {
    raw: Vec<RawHandle>,
}

impl SentinelArray {
    /// Wraps a raw engine array.
    pub fn from_raw(raw: Vec<RawHandle>) -> Self {
        Self { raw }
    }

    /// Builds an engine-style array from handles, appending the terminator.
    pub fn terminated<I>(handles: I) -> Self
    where
        I: IntoIterator<Item = RawHandle>,
    {
        let mut raw: Vec<RawHandle> = handles.into_iter().collect();
        raw.push(SENTINEL);
        Self { raw }
    }

    /// Number of entries before the terminator.
    pub fn count(&self) -> usize {
        self.raw
            .iter()
            .position(|&h| h == SENTINEL)
            .unwrap_or(self.raw.len())
    }
}

/// A list of handles as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HandleList<H> {
    len: usize,
    val: Vec<H>,
}

impl<H: Handle> HandleList<H> {
    /// Explicit element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The handles, in engine order.
    pub fn as_slice(&self) -> &[H] {
        &self.val
    }

    /// Consumes the list, returning the handles.
    pub fn into_vec(self) -> Vec<H> {
        self.val
    }

    /// Iterates over the handles.
    pub fn iter(&self) -> std::slice::Iter<'_, H> {
        self.val.iter()
    }
}

impl<'a, H: Handle> IntoIterator for &'a HandleList<H> {
    type Item = &'a H;
    type IntoIter = std::slice::Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.val.iter()
    }
}

/// Children of a node.
pub type NodeList = HandleList<NodeHandle>;

/// Values of a node.
pub type ValueList = HandleList<ValueHandle>;

/// Converts an engine array into a dense list.
///
/// Counts once, reserves exactly that many slots, then copies in order. The
/// engine array is consumed and released on every path, including a failed
/// reservation.
///
/// # Errors
///
/// Returns an `OutOfMemory` error if the output buffer cannot be allocated.
pub fn to_list<H: Handle>(array: SentinelArray) -> io::Result<HandleList<H>> {
    let len = array.count();

    let mut val = Vec::new();
    val.try_reserve_exact(len)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e.to_string()))?;
    val.extend(array.raw[..len].iter().map(|&raw| H::from_raw(raw)));

    Ok(HandleList { len, val })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let list: HandleList<NodeHandle> = to_list(SentinelArray::terminated([])).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.as_slice(), &[] as &[NodeHandle]);
    }

    #[test]
    fn test_order_preserved() {
        let list: HandleList<NodeHandle> =
            to_list(SentinelArray::terminated([0x30, 0x10, 0x20])).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(
            list.into_vec(),
            vec![NodeHandle(0x30), NodeHandle(0x10), NodeHandle(0x20)]
        );
    }

    #[test]
    fn test_stops_at_first_sentinel() {
        let array = SentinelArray::from_raw(vec![5, 6, 0, 7, 0]);
        assert_eq!(array.count(), 2);
        let list: HandleList<NodeHandle> = to_list(array).unwrap();
        assert_eq!(list.into_vec(), vec![NodeHandle(5), NodeHandle(6)]);
    }

    #[test]
    fn test_unterminated_array_taken_whole() {
        let list: HandleList<NodeHandle> = to_list(SentinelArray::from_raw(vec![1, 2])).unwrap();
        assert_eq!(list.len(), 2);
    }
}

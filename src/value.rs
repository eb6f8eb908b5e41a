//! Registry value types and the value record handed to the engine.
//!
//! The adapter moves value payloads around as opaque bytes and never checks
//! them against their type code.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Registry value data types, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    /// No value type.
    None,
    /// String.
    String,
    /// String with environment variables.
    ExpandString,
    /// Binary data.
    Binary,
    /// 32-bit little-endian integer.
    Dword,
    /// 32-bit big-endian integer.
    DwordBigEndian,
    /// Symbolic link.
    Link,
    /// Multiple strings.
    MultiString,
    /// Resource list.
    ResourceList,
    /// Full resource descriptor.
    FullResourceDescriptor,
    /// Resource requirements list.
    ResourceRequirementsList,
    /// 64-bit little-endian integer.
    Qword,
    /// Any other type code. Hives may carry arbitrary codes.
    Unknown(u32),
}

/// Known type codes, indexed by code.
const KNOWN: [(ValueType, &str); 12] = [
    (ValueType::None, "REG_NONE"),
    (ValueType::String, "REG_SZ"),
    (ValueType::ExpandString, "REG_EXPAND_SZ"),
    (ValueType::Binary, "REG_BINARY"),
    (ValueType::Dword, "REG_DWORD"),
    (ValueType::DwordBigEndian, "REG_DWORD_BIG_ENDIAN"),
    (ValueType::Link, "REG_LINK"),
    (ValueType::MultiString, "REG_MULTI_SZ"),
    (ValueType::ResourceList, "REG_RESOURCE_LIST"),
    (ValueType::FullResourceDescriptor, "REG_FULL_RESOURCE_DESCRIPTOR"),
    (ValueType::ResourceRequirementsList, "REG_RESOURCE_REQUIREMENTS_LIST"),
    (ValueType::Qword, "REG_QWORD"),
];

impl ValueType {
    /// Converts a raw type code. Every code is accepted.
    pub fn from_code(code: u32) -> Self {
        KNOWN
            .get(code as usize)
            .map_or(ValueType::Unknown(code), |(t, _)| *t)
    }

    /// Returns the numeric type code.
    pub fn code(&self) -> u32 {
        match self {
            ValueType::Unknown(code) => *code,
            known => KNOWN
                .iter()
                .position(|(t, _)| t == known)
                .map_or(0, |i| i as u32),
        }
    }

    /// Returns the symbolic name, or `None` for codes outside the known set.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ValueType::Unknown(_) => None,
            known => KNOWN.iter().find(|(t, _)| t == known).map(|(_, n)| *n),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "type {:#x}", self.code()),
        }
    }
}

/// One named value: key, type code and raw payload.
///
/// This is the single assignment record `hivex_node_set_value` hands to the
/// engine. The type code is carried exactly as the caller sent it; whether
/// it is acceptable is for the engine to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueRecord {
    /// Value name. The empty string is the key's default value.
    pub key: String,
    /// Type code as received on the wire.
    pub type_code: i64,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl ValueRecord {
    /// Creates a record.
    pub fn new(key: impl Into<String>, type_code: i64, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            type_code,
            payload,
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Short hex preview of the payload, for logging.
    pub fn preview(&self) -> String {
        const PREVIEW_BYTES: usize = 16;
        let shown = &self.payload[..self.payload.len().min(PREVIEW_BYTES)];
        if shown.len() < self.payload.len() {
            format!("{}..", hex::encode(shown))
        } else {
            hex::encode(shown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_codes() {
        assert_eq!(ValueType::from_code(1), ValueType::String);
        assert_eq!(ValueType::from_code(11), ValueType::Qword);
        assert_eq!(ValueType::from_code(999), ValueType::Unknown(999));
        assert_eq!(ValueType::Unknown(999).code(), 999);
        assert_eq!(ValueType::DwordBigEndian.code(), 5);
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::Dword.to_string(), "REG_DWORD");
        assert_eq!(ValueType::Unknown(0x20).to_string(), "type 0x20");
        assert_eq!(ValueType::Unknown(0x20).name(), None);
    }

    #[test]
    fn test_record_keeps_raw_type_code() {
        let rec = ValueRecord::new("x", -1, vec![]);
        assert_eq!(rec.type_code, -1);
        assert!(rec.is_empty());
    }

    #[test]
    fn test_preview_truncates() {
        let rec = ValueRecord::new("x", 3, vec![0xab; 20]);
        assert_eq!(rec.preview(), format!("{}..", "ab".repeat(16)));
        let small = ValueRecord::new("x", 3, b"hi".to_vec());
        assert_eq!(small.preview(), "6869");
    }
}

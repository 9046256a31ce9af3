//! Byte order and alignment modes
//!
//! A [`ByteOrder`] decides two things for a primitive codec:
//! the byte order of multi-byte scalars, and whether padding is inserted
//! between adjacent scalars so each lands on its native alignment.
//!
//! | Mode | Order | Alignment |
//! |------|-------|-----------|
//! | `LittleEndian` | little | none |
//! | `BigEndian` | big | none |
//! | `NativeAligned` | native | native |
//! | `Native` | native | none |
//! | `Network` | big | none |
//!
//! `NativeAligned` is the default, matching a native packing call that was
//! given no explicit mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order / alignment mode applied to primitive codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Little-endian, no alignment
    LittleEndian,
    /// Big-endian, no alignment
    BigEndian,
    /// Native byte order with native alignment
    #[default]
    NativeAligned,
    /// Native byte order, no alignment
    Native,
    /// Network order (big-endian), no alignment
    Network,
}

impl ByteOrder {
    /// All five modes
    pub const ALL: [ByteOrder; 5] = [
        ByteOrder::LittleEndian,
        ByteOrder::BigEndian,
        ByteOrder::NativeAligned,
        ByteOrder::Native,
        ByteOrder::Network,
    ];

    /// Whether adjacent scalars are padded to their native alignment
    pub fn is_aligned(self) -> bool {
        matches!(self, ByteOrder::NativeAligned)
    }

    /// Whether multi-byte scalars are written least significant byte first
    pub fn is_little_endian(self) -> bool {
        match self {
            ByteOrder::LittleEndian => true,
            ByteOrder::BigEndian | ByteOrder::Network => false,
            ByteOrder::NativeAligned | ByteOrder::Native => cfg!(target_endian = "little"),
        }
    }

    /// Conventional single-character marker (`<`, `>`, `@`, `=`, `!`)
    pub fn marker(self) -> char {
        match self {
            ByteOrder::LittleEndian => '<',
            ByteOrder::BigEndian => '>',
            ByteOrder::NativeAligned => '@',
            ByteOrder::Native => '=',
            ByteOrder::Network => '!',
        }
    }

    /// Parse a single-character marker
    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '<' => Some(ByteOrder::LittleEndian),
            '>' => Some(ByteOrder::BigEndian),
            '@' => Some(ByteOrder::NativeAligned),
            '=' => Some(ByteOrder::Native),
            '!' => Some(ByteOrder::Network),
            _ => None,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ByteOrder::LittleEndian => "little_endian",
            ByteOrder::BigEndian => "big_endian",
            ByteOrder::NativeAligned => "native_aligned",
            ByteOrder::Native => "native",
            ByteOrder::Network => "network",
        };
        f.write_str(name)
    }
}

/// How a derived schema treats a byte order that differs from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrderPolicy {
    /// Base and derived byte orders must match
    #[default]
    Strict,
    /// The derived byte order replaces the base's for every field
    Override,
}

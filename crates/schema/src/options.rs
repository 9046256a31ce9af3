//! Schema configuration
//!
//! ```
//! use structpack_schema::SchemaOptions;
//! use structpack_core::{ByteOrder, ByteOrderPolicy};
//!
//! let opts: SchemaOptions =
//!     serde_json::from_str(r#"{"byte_order": "little_endian"}"#).unwrap();
//! assert_eq!(opts.byte_order, ByteOrder::LittleEndian);
//! assert_eq!(opts.byte_order_policy, ByteOrderPolicy::Strict);
//! ```

use serde::{Deserialize, Serialize};
use structpack_core::{ByteOrder, ByteOrderPolicy};

/// Options applied when a schema is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Byte order applied to every field
    pub byte_order: ByteOrder,
    /// How [`Schema::extend`](crate::Schema::extend) treats a byte order
    /// differing from the base schema's
    pub byte_order_policy: ByteOrderPolicy,
}

impl SchemaOptions {
    /// Little-endian, no alignment
    pub fn little_endian() -> Self {
        Self::with_byte_order(ByteOrder::LittleEndian)
    }

    /// Big-endian, no alignment
    pub fn big_endian() -> Self {
        Self::with_byte_order(ByteOrder::BigEndian)
    }

    /// Network order, no alignment
    pub fn network() -> Self {
        Self::with_byte_order(ByteOrder::Network)
    }

    /// Given byte order, strict policy
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        SchemaOptions {
            byte_order,
            byte_order_policy: ByteOrderPolicy::Strict,
        }
    }

    /// Same options with the override policy
    pub fn overriding(mut self) -> Self {
        self.byte_order_policy = ByteOrderPolicy::Override;
        self
    }
}

//! # Structpack
//!
//! Declarative fixed-layout binary record codecs.
//!
//! A record layout is an ordered list of named fields, each backed by a
//! codec. Adjacent fixed-width scalar fields merge into a single layout, so a
//! schema of primitives packs as one contiguous run with the padding rules of
//! its byte order.
//!
//! ## Quick Start
//!
//! ```
//! use structpack::prelude::*;
//! use std::sync::Arc;
//!
//! let schema = Schema::builder("Chunk")
//!     .options(SchemaOptions::little_endian())
//!     .field("id", PrimitiveKind::Bytes(4).codec())
//!     .field("size", PrimitiveKind::U32.codec())
//!     .field(
//!         "name",
//!         Arc::new(TextCodec::utf8(Arc::new(TerminatedCodec::new(0)))?),
//!     )
//!     .build()?;
//!
//! let record = Record::new()
//!     .with("id", &b"LIST"[..])
//!     .with("size", 12u32)
//!     .with("name", "info");
//! let bytes = schema.pack(&record)?;
//! assert_eq!(schema.unpack(&bytes)?, record);
//! # Ok::<(), structpack::Error>(())
//! ```
//!
//! ## Crates
//!
//! - [`structpack_core`]: values, records, byte orders and errors
//! - [`structpack_codec`]: the codec algebra (primitives, arrays, strings,
//!   unions, conditionals)
//! - [`structpack_schema`]: record schemas built from field lists

#![warn(missing_docs)]

pub mod prelude;

pub use structpack_core::{ByteOrder, ByteOrderPolicy, Error, ErrorKind, Record, RecordView, Result, Value};
pub use structpack_schema::{Schema, SchemaBuilder, SchemaOptions};

//! Convenient imports for structpack.
//!
//! ```
//! use structpack::prelude::*;
//!
//! let codec = PrimitiveKind::U16.codec().with_byte_order(ByteOrder::Network);
//! assert_eq!(codec.pack(&[Value::UInt(258)]).unwrap(), vec![1, 2]);
//! ```

// Values and errors
pub use structpack_core::{ByteOrder, ByteOrderPolicy, Error, ErrorKind, Record, RecordView, Result, Value};

// Codecs
pub use structpack_codec::{
    compose, fold, ArrayCodec, ByteSource, Codec, ConditionalCodec, Count, DataSize,
    DecisionTable, DotNetCodec, ForwardOnly, Header, LookaheadCodec, LookbackCodec,
    PrefixedBytesCodec, PrimitiveCodec, PrimitiveKind, RemainingCodec, SharedCodec,
    TerminatedCodec, TextCodec, TupleCodec, UIntWidth,
};

// Schemas
pub use structpack_schema::{
    FieldDescriptor, NestedRecordCodec, Schema, SchemaBuilder, SchemaOptions, SchemaPatch,
    SchemaSlot,
};

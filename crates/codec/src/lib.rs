//! Codec algebra for structpack
//!
//! This crate implements the pack/unpack engine:
//!
//! - [`Codec`]: the capability every codec implements, over buffers and streams
//! - [`PrimitiveCodec`]: merged runs of fixed-width scalars under a [`ByteOrder`]
//! - [`compose`] / [`fold`]: the algebra joining codecs, merging adjacent primitives
//! - [`ArrayCodec`] + [`Header`]: repeated elements with constant, prefixed or
//!   field-driven counts and optional data size checks
//! - byte string codecs and [`TextCodec`]
//! - [`LookbackCodec`] / [`LookaheadCodec`]: tagged unions over a [`DecisionTable`]
//! - [`ConditionalCodec`] and [`TupleCodec`]
//!
//! [`ByteOrder`]: structpack_core::ByteOrder

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod codec;
pub mod compound;
pub mod conditional;
pub mod header;
pub mod primitive;
pub mod strings;
pub mod text;
pub mod tuple;
pub mod union;

pub use array::ArrayCodec;
pub use codec::{copy_into, ByteSource, Codec, ForwardOnly, SharedCodec, SizeCell, Unpacked};
pub use compound::{compose, fold, CompoundCodec, NullCodec};
pub use conditional::{ConditionalCodec, Predicate};
pub use header::{Count, DataSize, Header};
pub use primitive::{PrimitiveCodec, PrimitiveKind, UIntWidth};
pub use strings::{DotNetCodec, PrefixedBytesCodec, RemainingCodec, TerminatedCodec};
pub use text::{Ascii, Latin1, TextCodec, TextEncoding, Utf8};
pub use tuple::TupleCodec;
pub use union::{Decider, DecisionTable, LookaheadCodec, LookbackCodec};

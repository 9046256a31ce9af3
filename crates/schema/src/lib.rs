//! Record schemas for structpack
//!
//! A [`Schema`] turns an ordered list of [`FieldDescriptor`]s into one record
//! codec and packs or unpacks whole [`Record`](structpack_core::Record)s:
//!
//! - [`SchemaBuilder`]: collects fields, validates them and folds the codecs
//! - [`SchemaOptions`]: byte order and the policy for derived schemas
//! - [`SchemaPatch`] + [`Schema::extend`]: derive a schema from a base
//! - [`NestedRecordCodec`] / [`SchemaSlot`]: schemas as fields, including
//!   recursive layouts

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field;
pub mod nested;
pub mod options;
pub mod patch;
pub mod schema;

pub use field::{FieldDescriptor, Visibility};
pub use nested::{NestedRecordCodec, SchemaSlot};
pub use options::SchemaOptions;
pub use patch::SchemaPatch;
pub use schema::{Schema, SchemaBuilder};

//! Core types for structpack
//!
//! This crate defines the types shared by every codec and schema:
//! - [`Value`]: dynamic value packed and unpacked by codecs
//! - [`Record`] and [`RecordView`]: named field values and the partial view
//!   handed to union deciders and conditional predicates
//! - [`ByteOrder`]: the five byte order / alignment modes
//! - [`Error`] and [`Result`]: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod byte_order;
pub mod error;
pub mod record;
pub mod value;

pub use byte_order::{ByteOrder, ByteOrderPolicy};
pub use error::{Error, ErrorKind, Result};
pub use record::{Record, RecordView};
pub use value::Value;

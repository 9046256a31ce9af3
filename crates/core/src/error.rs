//! Error types for structpack.
//!
//! Every pack/unpack failure is reported synchronously by the call that
//! triggered it. Nothing is retried internally; after a failed stream
//! operation the caller should treat the stream position as undefined.
//!
//! ## Error Kinds
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | ShapeMismatch | fixed array length wrong, array data size mismatched, value count wrong |
//! | TruncatedInput | input exhausted early, unterminated string, output buffer too small |
//! | UnresolvedVariant | union key missing from its decision table with no default |
//! | Encoding | text encode/decode failed |
//! | InvalidValue | a value has the wrong type or range for its codec, or a field is missing |
//! | InvalidSchema | a codec or schema was built from inconsistent parts |
//! | Io | the underlying reader/writer failed |

use crate::value::Value;
use thiserror::Error;

/// All structpack errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A count or size did not match what the layout requires
    #[error("shape mismatch: {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being checked
        what: &'static str,
        /// Required count or size
        expected: usize,
        /// Count or size found
        actual: usize,
    },

    /// Input ran out before a codec's bytes were available
    #[error("truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Bytes required
        needed: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Terminator-delimited string hit end of input
    #[error("unterminated string: terminator {terminator:#04x} not found")]
    UnterminatedString {
        /// The terminator byte searched for
        terminator: u8,
    },

    /// Output buffer cannot hold the packed bytes
    #[error("buffer too small: needed {needed} bytes, {available} available")]
    BufferTooSmall {
        /// Bytes required from the offset
        needed: usize,
        /// Bytes available from the offset
        available: usize,
    },

    /// Union decider produced a key with no mapped codec and no default
    #[error("unresolved variant: no codec mapped for key {key:?}")]
    UnresolvedVariant {
        /// The decided key
        key: Value,
    },

    /// Text transform failed
    #[error("{encoding} encoding error: {message}")]
    Encoding {
        /// Encoding name
        encoding: &'static str,
        /// What went wrong
        message: String,
    },

    /// Value has the wrong type for its codec
    #[error("invalid value: expected {expected}, got {actual}")]
    InvalidValue {
        /// Expected value type
        expected: &'static str,
        /// Actual value type
        actual: &'static str,
    },

    /// Value does not fit its wire type
    #[error("value out of range for {kind}: {value}")]
    OutOfRange {
        /// Wire type name
        kind: &'static str,
        /// Offending value, formatted
        value: String,
    },

    /// Record being packed lacks a declared field
    #[error("missing field: {name}")]
    MissingField {
        /// Field name
        name: String,
    },

    /// Codec or schema construction error
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for structpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Count/size mismatch
    ShapeMismatch,
    /// Input or output space exhausted
    TruncatedInput,
    /// Union key without a codec
    UnresolvedVariant,
    /// Text transform failure
    Encoding,
    /// Wrong value type, range, or missing field
    InvalidValue,
    /// Inconsistent codec/schema construction
    InvalidSchema,
    /// Reader/writer failure
    Io,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Error::TruncatedInput { .. }
            | Error::UnterminatedString { .. }
            | Error::BufferTooSmall { .. } => ErrorKind::TruncatedInput,
            Error::UnresolvedVariant { .. } => ErrorKind::UnresolvedVariant,
            Error::Encoding { .. } => ErrorKind::Encoding,
            Error::InvalidValue { .. } | Error::OutOfRange { .. } | Error::MissingField { .. } => {
                ErrorKind::InvalidValue
            }
            Error::InvalidSchema(_) => ErrorKind::InvalidSchema,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Check if input (or output space) ran out
    pub fn is_truncated(&self) -> bool {
        self.kind() == ErrorKind::TruncatedInput
    }

    /// Check if this is a count/size mismatch
    pub fn is_shape_mismatch(&self) -> bool {
        self.kind() == ErrorKind::ShapeMismatch
    }

    /// Check if a union key was not resolved
    pub fn is_unresolved_variant(&self) -> bool {
        self.kind() == ErrorKind::UnresolvedVariant
    }

    /// Shorthand for a wrong-typed value
    pub fn invalid_value(expected: &'static str, actual: &Value) -> Self {
        Error::InvalidValue {
            expected,
            actual: actual.type_name(),
        }
    }

    /// Shorthand for an input that ran out
    pub fn truncated(needed: usize, available: usize) -> Self {
        Error::TruncatedInput { needed, available }
    }
}

//! Array headers
//!
//! A [`Header`] says where an array's element count comes from and whether
//! the serialized byte size of its elements is recorded for checking.
//!
//! | Constructor | Count | Data size |
//! |-------------|-------|-----------|
//! | `fixed(n)` | constant `n` | none |
//! | `fixed_checked(n, w)` | constant `n` | `w`-wide prefix |
//! | `prefixed(w)` | `w`-wide prefix | none |
//! | `prefixed_checked(cw, sw)` | `cw`-wide prefix | `sw`-wide prefix |
//! | `field(name)` | earlier record field | none |
//! | `field_checked(count, size)` | earlier record field | earlier record field |
//!
//! Prefixes are written immediately before the elements, count first, as one
//! merged primitive.

use smallvec::SmallVec;
use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::primitive::{PrimitiveCodec, PrimitiveKind, UIntWidth};

/// Where the element count comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Count {
    /// Constant
    Fixed(usize),
    /// Unsigned integer written before the elements
    Prefixed(UIntWidth),
    /// Value of an earlier field of the enclosing record
    Field(String),
}

/// Where the checked byte size of the elements comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSize {
    /// Not recorded
    Unchecked,
    /// Unsigned integer written after the count prefix
    Prefixed(UIntWidth),
    /// Value of an earlier field of the enclosing record
    Field(String),
}

/// Count and size strategy of an array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    count: Count,
    size: DataSize,
}

impl Header {
    /// Constant count
    pub fn fixed(count: usize) -> Self {
        Header {
            count: Count::Fixed(count),
            size: DataSize::Unchecked,
        }
    }

    /// Constant count, data size written as a prefix
    pub fn fixed_checked(count: usize, size_width: UIntWidth) -> Self {
        Header {
            count: Count::Fixed(count),
            size: DataSize::Prefixed(size_width),
        }
    }

    /// Count written as a prefix
    pub fn prefixed(count_width: UIntWidth) -> Self {
        Header {
            count: Count::Prefixed(count_width),
            size: DataSize::Unchecked,
        }
    }

    /// Count then data size written as prefixes
    pub fn prefixed_checked(count_width: UIntWidth, size_width: UIntWidth) -> Self {
        Header {
            count: Count::Prefixed(count_width),
            size: DataSize::Prefixed(size_width),
        }
    }

    /// Count taken from an earlier field (dotted paths reach nested records)
    pub fn field(name: impl Into<String>) -> Self {
        Header {
            count: Count::Field(name.into()),
            size: DataSize::Unchecked,
        }
    }

    /// Count and data size taken from earlier fields
    pub fn field_checked(count_field: impl Into<String>, size_field: impl Into<String>) -> Self {
        Header {
            count: Count::Field(count_field.into()),
            size: DataSize::Field(size_field.into()),
        }
    }

    /// Count strategy
    pub fn count(&self) -> &Count {
        &self.count
    }

    /// Data size strategy
    pub fn data_size(&self) -> &DataSize {
        &self.size
    }

    /// Whether the elements' byte size is checked
    pub fn is_checked(&self) -> bool {
        !matches!(self.size, DataSize::Unchecked)
    }

    /// Whether unpacking takes the count from the input rather than a constant
    pub fn count_from_input(&self) -> bool {
        !matches!(self.count, Count::Fixed(_))
    }

    /// The merged prefix written before the elements (may be empty)
    pub fn prefix_codec(&self, order: ByteOrder) -> PrimitiveCodec {
        let mut items: SmallVec<[PrimitiveKind; 2]> = SmallVec::new();
        if let Count::Prefixed(w) = self.count {
            items.push(w.kind());
        }
        if let DataSize::Prefixed(w) = self.size {
            items.push(w.kind());
        }
        PrimitiveCodec::from_items(items, order)
    }

    /// Validate a list about to be packed against the count strategy
    pub fn check_count(&self, ctx: &RecordView<'_>, len: usize) -> Result<()> {
        let expected = match &self.count {
            Count::Fixed(n) => *n,
            Count::Prefixed(_) => return Ok(()),
            Count::Field(name) => field_uint(ctx, name)?,
        };
        if len != expected {
            return Err(Error::ShapeMismatch {
                what: "array length",
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    /// Validate packed element bytes against a size field
    pub fn check_packed_size(&self, ctx: &RecordView<'_>, data_size: usize) -> Result<()> {
        if let DataSize::Field(name) = &self.size {
            check_data_size(field_uint(ctx, name)?, data_size)?;
        }
        Ok(())
    }

    /// Values for [`Header::prefix_codec`]
    pub fn prefix_values(&self, len: usize, data_size: usize) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(2);
        if let Count::Prefixed(w) = self.count {
            values.push(w.fit(len)?);
        }
        if let DataSize::Prefixed(w) = self.size {
            values.push(w.fit(data_size)?);
        }
        Ok(values)
    }

    /// Resolve `(count, declared data size)` from decoded prefix values
    pub fn resolve(&self, ctx: &RecordView<'_>, prefix: &[Value]) -> Result<(usize, Option<usize>)> {
        let mut prefix = prefix.iter();
        let mut next = || -> Result<usize> {
            let value = prefix.next().ok_or(Error::ShapeMismatch {
                what: "array header value count",
                expected: 1,
                actual: 0,
            })?;
            to_usize(value)
        };
        let count = match &self.count {
            Count::Fixed(n) => *n,
            Count::Prefixed(_) => next()?,
            Count::Field(name) => field_uint(ctx, name)?,
        };
        let size = match &self.size {
            DataSize::Unchecked => None,
            DataSize::Prefixed(_) => Some(next()?),
            DataSize::Field(name) => Some(field_uint(ctx, name)?),
        };
        Ok((count, size))
    }
}

/// Compare declared and actual element byte sizes
pub fn check_data_size(declared: usize, actual: usize) -> Result<()> {
    if declared != actual {
        return Err(Error::ShapeMismatch {
            what: "array data size",
            expected: declared,
            actual,
        });
    }
    Ok(())
}

fn to_usize(value: &Value) -> Result<usize> {
    let n = value
        .as_uint()
        .ok_or_else(|| Error::invalid_value("unsigned integer", value))?;
    usize::try_from(n).map_err(|_| Error::OutOfRange {
        kind: "usize",
        value: n.to_string(),
    })
}

fn field_uint(ctx: &RecordView<'_>, name: &str) -> Result<usize> {
    let value = ctx.get_path(name).ok_or_else(|| Error::MissingField {
        name: name.to_string(),
    })?;
    to_usize(value)
}

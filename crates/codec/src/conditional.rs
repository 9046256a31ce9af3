//! Conditional fields
//!
//! A [`ConditionalCodec`] runs its inner codec only when a predicate over the
//! record state holds. Otherwise packing writes nothing and unpacking leaves
//! the input untouched and yields the default value.
//!
//! The wrapper is never a primitive, so it stops the compose algebra from
//! merging the wrapped field with its neighbours. Under `NativeAligned` that
//! can change the padding around the field even when the predicate is always
//! true. This is observable layout behaviour and is kept as is.

use std::fmt;
use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};
use tracing::trace;

use crate::codec::{expect_values, ByteSource, Codec, SharedCodec, SizeCell, Unpacked};

/// Predicate over record state
pub type Predicate = Arc<dyn Fn(&RecordView<'_>) -> bool + Send + Sync>;

/// Present-or-default wrapper around a single-value codec
#[derive(Clone)]
pub struct ConditionalCodec {
    inner: SharedCodec,
    predicate: Predicate,
    default: Value,
    last: SizeCell,
}

impl ConditionalCodec {
    /// Wrap `inner`, yielding `default` when `predicate` is false
    pub fn new<F>(inner: SharedCodec, predicate: F, default: impl Into<Value>) -> Result<Self>
    where
        F: Fn(&RecordView<'_>) -> bool + Send + Sync + 'static,
    {
        if inner.value_count() != 1 {
            return Err(Error::InvalidSchema(format!(
                "conditional codec wraps one value, got {}",
                inner.value_count()
            )));
        }
        Ok(ConditionalCodec {
            inner,
            predicate: Arc::new(predicate),
            default: default.into(),
            last: SizeCell::default(),
        })
    }

    /// Value produced when the field is absent
    pub fn default_value(&self) -> &Value {
        &self.default
    }
}

impl fmt::Debug for ConditionalCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalCodec")
            .field("inner", &self.inner)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl Codec for ConditionalCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        expect_values("conditional value count", 1, values)?;
        if !(self.predicate)(ctx) {
            trace!(target: "structpack::conditional", "skipped on pack");
            return Ok(self.last.record(0));
        }
        let written = self.inner.pack_to(ctx, values, out)?;
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        if !(self.predicate)(ctx) {
            trace!(target: "structpack::conditional", "skipped on unpack");
            return Ok(Unpacked::single(self.default.clone(), self.last.record(0)));
        }
        let unpacked = self.inner.unpack_at(ctx, buf, offset)?;
        self.last.record(unpacked.size);
        Ok(unpacked)
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        if !(self.predicate)(ctx) {
            trace!(target: "structpack::conditional", "skipped on unpack");
            return Ok(Unpacked::single(self.default.clone(), self.last.record(0)));
        }
        let unpacked = self.inner.unpack_read(ctx, src)?;
        self.last.record(unpacked.size);
        Ok(unpacked)
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(ConditionalCodec {
            inner: self.inner.with_byte_order(order),
            predicate: Arc::clone(&self.predicate),
            default: self.default.clone(),
            last: SizeCell::default(),
        })
    }

    fn is_final(&self) -> bool {
        self.inner.is_final()
    }
}

//! Tuple codec: several codecs grouped into one `Value::List`

use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::codec::{expect_values, ByteSource, Codec, SharedCodec, SizeCell, Unpacked};
use crate::compound::fold;

/// Composed members packed from, and unpacked to, a single list value
#[derive(Debug, Clone)]
pub struct TupleCodec {
    inner: SharedCodec,
    last: SizeCell,
}

impl TupleCodec {
    /// Compose `members` in order
    pub fn new<I>(members: I) -> Result<Self>
    where
        I: IntoIterator<Item = SharedCodec>,
    {
        Ok(TupleCodec {
            inner: fold(members)?,
            last: SizeCell::default(),
        })
    }

    /// Number of values in the list
    pub fn arity(&self) -> usize {
        self.inner.value_count()
    }
}

impl Codec for TupleCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        expect_values("tuple value count", 1, values)?;
        let members = values[0]
            .as_list()
            .ok_or_else(|| Error::invalid_value("List", &values[0]))?;
        expect_values("tuple length", self.arity(), members)?;
        let written = self.inner.pack_to(&ctx.detached(), members, out)?;
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let unpacked = self.inner.unpack_at(&ctx.detached(), buf, offset)?;
        Ok(Unpacked::single(
            Value::List(unpacked.values),
            self.last.record(unpacked.size),
        ))
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let unpacked = self.inner.unpack_read(&ctx.detached(), src)?;
        Ok(Unpacked::single(
            Value::List(unpacked.values),
            self.last.record(unpacked.size),
        ))
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(TupleCodec {
            inner: self.inner.with_byte_order(order),
            last: SizeCell::default(),
        })
    }

    fn is_final(&self) -> bool {
        self.inner.is_final()
    }
}

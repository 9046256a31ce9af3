//! The compose algebra
//!
//! [`compose`] joins two codecs into one whose values are the concatenation
//! of theirs. Adjacent primitive codecs sharing a byte order are merged into a
//! single wider [`PrimitiveCodec`]; anything else is chained in a flat
//! [`CompoundCodec`]. [`NullCodec`] is the identity on both sides.
//!
//! Merging matters for byte-exact layouts: under `NativeAligned` only one
//! merged primitive inserts padding between its items, two chained ones never
//! pad across the seam.

use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};
use tracing::trace;

use crate::codec::{expect_values, ByteSource, Codec, SharedCodec, SizeCell, Unpacked};
use crate::primitive::PrimitiveCodec;

/// Identity codec: no values, no bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl NullCodec {
    /// Shared instance
    pub fn shared() -> SharedCodec {
        Arc::new(NullCodec)
    }
}

impl Codec for NullCodec {
    fn value_count(&self) -> usize {
        0
    }

    fn last_size(&self) -> usize {
        0
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], _out: &mut Vec<u8>) -> Result<usize> {
        expect_values("null value count", 0, values)?;
        Ok(0)
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, _buf: &[u8], _offset: usize) -> Result<Unpacked> {
        Ok(Unpacked::new(Vec::new(), 0))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, _src: &mut dyn ByteSource) -> Result<Unpacked> {
        Ok(Unpacked::new(Vec::new(), 0))
    }

    fn with_byte_order(&self, _order: ByteOrder) -> SharedCodec {
        Arc::new(NullCodec)
    }

    fn is_null(&self) -> bool {
        true
    }
}

/// Flat sequence of codecs run one after another
///
/// While unpacking under a view that tracks record fields, each part sees
/// the values decoded by the parts before it.
#[derive(Debug, Clone)]
pub struct CompoundCodec {
    parts: Vec<SharedCodec>,
    value_count: usize,
    last: SizeCell,
}

impl CompoundCodec {
    fn from_parts(parts: Vec<SharedCodec>) -> Self {
        let value_count = parts.iter().map(|p| p.value_count()).sum();
        CompoundCodec {
            parts,
            value_count,
            last: SizeCell::default(),
        }
    }

    /// Component codecs in order
    pub fn parts(&self) -> &[SharedCodec] {
        &self.parts
    }
}

impl Codec for CompoundCodec {
    fn value_count(&self) -> usize {
        self.value_count
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        expect_values("compound value count", self.value_count, values)?;
        let start = out.len();
        let mut idx = 0;
        for part in &self.parts {
            let n = part.value_count();
            if let Err(e) = part.pack_to(ctx, &values[idx..idx + n], out) {
                out.truncate(start);
                return Err(e);
            }
            idx += n;
        }
        Ok(self.last.record(out.len() - start))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let mut values = Vec::with_capacity(self.value_count);
        let mut cursor = offset;
        for part in &self.parts {
            let unpacked = if ctx.tracks_fields() {
                part.unpack_at(&ctx.with_known(&values), buf, cursor)?
            } else {
                part.unpack_at(ctx, buf, cursor)?
            };
            cursor += unpacked.size;
            values.extend(unpacked.values);
        }
        Ok(Unpacked::new(values, self.last.record(cursor - offset)))
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let mut values = Vec::with_capacity(self.value_count);
        let mut size = 0;
        for part in &self.parts {
            let unpacked = if ctx.tracks_fields() {
                part.unpack_read(&ctx.with_known(&values), src)?
            } else {
                part.unpack_read(ctx, src)?
            };
            size += unpacked.size;
            values.extend(unpacked.values);
        }
        Ok(Unpacked::new(values, self.last.record(size)))
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        let parts = self.parts.iter().map(|p| p.with_byte_order(order));
        // Re-folding lets parts that now share an order merge.
        match fold(parts) {
            Ok(codec) => codec,
            Err(_) => Arc::new(CompoundCodec::from_parts(
                self.parts.iter().map(|p| p.with_byte_order(order)).collect(),
            )),
        }
    }

    fn is_final(&self) -> bool {
        self.parts.last().map_or(false, |p| p.is_final())
    }

    fn as_compound(&self) -> Option<&CompoundCodec> {
        Some(self)
    }
}

fn flatten(codec: &SharedCodec) -> Vec<SharedCodec> {
    match codec.as_compound() {
        Some(compound) => compound.parts.clone(),
        None if codec.is_null() => Vec::new(),
        None => vec![Arc::clone(codec)],
    }
}

fn merge(a: &SharedCodec, b: &SharedCodec) -> Option<PrimitiveCodec> {
    let (pa, pb) = (a.as_primitive()?, b.as_primitive()?);
    (pa.order() == pb.order()).then(|| pa.join(pb))
}

/// Join two codecs
///
/// The result packs `a`'s values then `b`'s. Fails with `InvalidSchema` when
/// `a` consumes all remaining input and `b` is not the identity.
pub fn compose(a: &SharedCodec, b: &SharedCodec) -> Result<SharedCodec> {
    if a.is_final() && !b.is_null() {
        return Err(Error::InvalidSchema(
            "a read-to-end codec must be the last field".to_string(),
        ));
    }
    if a.is_null() {
        return Ok(Arc::clone(b));
    }
    if b.is_null() {
        return Ok(Arc::clone(a));
    }
    if let Some(merged) = merge(a, b) {
        return Ok(Arc::new(merged));
    }

    let mut parts = flatten(a);
    for next in flatten(b) {
        match parts.last().and_then(|last| merge(last, &next)) {
            Some(merged) => {
                trace!(target: "structpack::compose", size = merged.size(), "merged adjacent primitives");
                let len = parts.len();
                parts[len - 1] = Arc::new(merged);
            }
            None => parts.push(next),
        }
    }
    Ok(Arc::new(CompoundCodec::from_parts(parts)))
}

/// Left fold of [`compose`] starting from [`NullCodec`]
pub fn fold<I>(codecs: I) -> Result<SharedCodec>
where
    I: IntoIterator<Item = SharedCodec>,
{
    codecs
        .into_iter()
        .try_fold(NullCodec::shared(), |acc, next| compose(&acc, &next))
}

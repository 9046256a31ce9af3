//! Array codec
//!
//! Packs a `Value::List` as a [`Header`] followed by the elements.
//!
//! When the element is a single-value primitive and the header records no
//! data size, the header prefix and all elements are laid out as one merged
//! primitive, so element alignment matches one native call for the whole run.
//! Otherwise elements are packed one after another; a checked header packs
//! them to a scratch buffer first to learn their byte size.

use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::codec::{
    expect_values, read_vec, remaining_len, slice_at, ByteSource, Codec, SharedCodec, SizeCell,
    Unpacked,
};
use crate::header::{check_data_size, Header};
use crate::primitive::PrimitiveCodec;

/// Repeats an element codec a header-determined number of times
#[derive(Debug, Clone)]
pub struct ArrayCodec {
    header: Header,
    element: SharedCodec,
    order: ByteOrder,
    prefix: PrimitiveCodec,
    last: SizeCell,
}

impl ArrayCodec {
    /// Array of `element` with the given header
    ///
    /// The header prefix takes the element's byte order when the element is
    /// primitive, the default order otherwise; schemas re-apply their own
    /// order to every field.
    pub fn new(header: Header, element: SharedCodec) -> Result<Self> {
        if element.value_count() != 1 {
            return Err(Error::InvalidSchema(format!(
                "array element must carry one value, not {}",
                element.value_count()
            )));
        }
        if element.is_final() {
            return Err(Error::InvalidSchema(
                "array element cannot read to end of input".to_string(),
            ));
        }
        if let Some(p) = element.as_primitive() {
            if header.is_checked() {
                return Err(Error::InvalidSchema(
                    "a data size header needs composite elements; primitive sizes are implied by the count"
                        .to_string(),
                ));
            }
            if p.size() == 0 {
                return Err(Error::InvalidSchema("array element has zero width".to_string()));
            }
        }
        let order = element
            .as_primitive()
            .map_or(ByteOrder::default(), |p| p.order());
        Ok(Self::build(header, element, order))
    }

    fn build(header: Header, element: SharedCodec, order: ByteOrder) -> Self {
        let prefix = header.prefix_codec(order);
        ArrayCodec {
            header,
            element,
            order,
            prefix,
            last: SizeCell::default(),
        }
    }

    /// Count/size strategy
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Element codec
    pub fn element(&self) -> &SharedCodec {
        &self.element
    }

    fn merged_element(&self) -> Option<&PrimitiveCodec> {
        if self.header.is_checked() {
            return None;
        }
        self.element.as_primitive()
    }

    fn merged_layout(&self, elem: &PrimitiveCodec, count: usize) -> PrimitiveCodec {
        self.prefix.join(&elem.repeated(count))
    }

    // An input count is only trusted as far as the input could back it: once
    // an element reads nothing, the items still owed must not outnumber the
    // bytes left.
    fn check_zero_width(&self, owed: usize, available: usize) -> Result<()> {
        if self.header.count_from_input() && owed > available {
            return Err(Error::truncated(owed, available));
        }
        Ok(())
    }

    fn list<'v>(values: &'v [Value]) -> Result<&'v [Value]> {
        expect_values("array value count", 1, values)?;
        values[0]
            .as_list()
            .ok_or_else(|| Error::invalid_value("List", &values[0]))
    }
}

impl Codec for ArrayCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let items = Self::list(values)?;
        self.header.check_count(ctx, items.len())?;

        if let Some(elem) = self.merged_element() {
            let layout = self.merged_layout(elem, items.len());
            let mut flat = self.header.prefix_values(items.len(), 0)?;
            flat.extend_from_slice(items);
            let written = layout.pack_to(ctx, &flat, out)?;
            return Ok(self.last.record(written));
        }

        let elem_ctx = ctx.detached();
        let mut data = Vec::new();
        for item in items {
            self.element
                .pack_to(&elem_ctx, std::slice::from_ref(item), &mut data)?;
        }
        self.header.check_packed_size(ctx, data.len())?;
        let prefix_values = self.header.prefix_values(items.len(), data.len())?;
        let written = self.prefix.pack_to(ctx, &prefix_values, out)?;
        out.extend_from_slice(&data);
        Ok(self.last.record(written + data.len()))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let prefix = self.prefix.unpack_at(ctx, buf, offset)?;
        let (count, declared) = self.header.resolve(ctx, &prefix.values)?;

        if let Some(elem) = self.merged_element() {
            // Lower bound before laying out `count` items.
            let needed = count.saturating_mul(elem.size());
            slice_at(buf, offset + prefix.size, needed)?;
            let layout = self.merged_layout(elem, count);
            let mut unpacked = layout.unpack_at(ctx, buf, offset)?;
            let items = unpacked.values.split_off(prefix.values.len());
            return Ok(Unpacked::single(Value::List(items), self.last.record(unpacked.size)));
        }

        let elem_ctx = ctx.detached();
        let start = offset + prefix.size;
        let mut cursor = start;
        let mut items = Vec::new();
        for i in 0..count {
            let unpacked = self.element.unpack_at(&elem_ctx, buf, cursor)?;
            if unpacked.size == 0 {
                self.check_zero_width(count - i - 1, buf.len().saturating_sub(cursor))?;
            }
            cursor += unpacked.size;
            items.extend(unpacked.values);
        }
        if let Some(declared) = declared {
            check_data_size(declared, cursor - start)?;
        }
        Ok(Unpacked::single(Value::List(items), self.last.record(cursor - offset)))
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        if let Some(elem) = self.merged_element() {
            let mut raw = read_vec(src, self.prefix.size())?;
            let prefix = self.prefix.unpack_at(ctx, &raw, 0)?;
            let (count, _) = self.header.resolve(ctx, &prefix.values)?;
            raw.extend(read_vec(src, count.saturating_mul(elem.size()))?);
            let layout = self.merged_layout(elem, count);
            let padding = layout.size().saturating_sub(raw.len());
            raw.extend(read_vec(src, padding)?);
            let mut unpacked = layout.unpack_at(ctx, &raw, 0)?;
            let items = unpacked.values.split_off(prefix.values.len());
            return Ok(Unpacked::single(Value::List(items), self.last.record(unpacked.size)));
        }

        let prefix = self.prefix.unpack_read(ctx, src)?;
        let (count, declared) = self.header.resolve(ctx, &prefix.values)?;
        let elem_ctx = ctx.detached();
        let mut data_size = 0;
        let mut items = Vec::new();
        for i in 0..count {
            let unpacked = self.element.unpack_read(&elem_ctx, src)?;
            if unpacked.size == 0 && self.header.count_from_input() {
                let available = remaining_len(src).map_or(0, |n| n as usize);
                self.check_zero_width(count - i - 1, available)?;
            }
            data_size += unpacked.size;
            items.extend(unpacked.values);
        }
        if let Some(declared) = declared {
            check_data_size(declared, data_size)?;
        }
        Ok(Unpacked::single(
            Value::List(items),
            self.last.record(prefix.size + data_size),
        ))
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(Self::build(
            self.header.clone(),
            self.element.with_byte_order(order),
            order,
        ))
    }
}

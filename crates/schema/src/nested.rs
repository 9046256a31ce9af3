//! Schemas used as field codecs
//!
//! [`NestedRecordCodec`] embeds one schema inside another as a single
//! `Value::Record`. The nested record keeps its own byte order and its own
//! field context: deciders inside it see the nested record, not the outer one.
//!
//! [`SchemaSlot`] ties recursive layouts together. The slot hands out a codec
//! before the schema exists and is bound once the schema is built. It keeps
//! only a weak reference, so a schema that contains itself does not leak.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use structpack_codec::{ByteSource, Codec, SharedCodec, SizeCell, Unpacked};
use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::schema::Schema;

/// A schema packed from, and unpacked to, one `Value::Record`
#[derive(Debug, Clone)]
pub struct NestedRecordCodec {
    schema: Arc<Schema>,
    last: SizeCell,
}

impl NestedRecordCodec {
    /// Wrap a schema
    pub fn new(schema: Arc<Schema>) -> Self {
        NestedRecordCodec {
            schema,
            last: SizeCell::default(),
        }
    }

    /// The wrapped schema
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

fn pack_nested(schema: &Schema, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
    if values.len() != 1 {
        return Err(Error::ShapeMismatch {
            what: "nested record value count",
            expected: 1,
            actual: values.len(),
        });
    }
    let record = values[0]
        .as_record()
        .ok_or_else(|| Error::invalid_value("Record", &values[0]))?;
    schema.pack_to(record, out)
}

impl Codec for NestedRecordCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let written = pack_nested(&self.schema, values, out)?;
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let (record, size) = self.schema.unpack_at(buf, offset)?;
        Ok(Unpacked::single(Value::Record(record), self.last.record(size)))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let (record, size) = self.schema.read_record(src)?;
        Ok(Unpacked::single(Value::Record(record), self.last.record(size)))
    }

    fn pack_write(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut dyn Write) -> Result<usize> {
        let mut bytes = Vec::new();
        let written = pack_nested(&self.schema, values, &mut bytes)?;
        out.write_all(&bytes)?;
        Ok(self.last.record(written))
    }

    // The nested schema keeps the order it was built with.
    fn with_byte_order(&self, _order: ByteOrder) -> SharedCodec {
        Arc::new(NestedRecordCodec::new(Arc::clone(&self.schema)))
    }

    fn is_final(&self) -> bool {
        self.schema.record_codec().is_final()
    }
}

/// Late-bound reference to a schema, for recursive layouts
///
/// ```
/// use std::sync::Arc;
/// use structpack_codec::{ConditionalCodec, PrimitiveKind};
/// use structpack_core::{Record, RecordView, Value};
/// use structpack_schema::{Schema, SchemaOptions, SchemaSlot};
///
/// let slot = SchemaSlot::new();
/// let next = ConditionalCodec::new(
///     slot.codec(),
///     |view: &RecordView<'_>| view.get("more").and_then(Value::as_uint) == Some(1),
///     Value::Null,
/// )
/// .unwrap();
/// let node = Arc::new(
///     Schema::builder("Node")
///         .options(SchemaOptions::network())
///         .field("value", PrimitiveKind::U8.codec())
///         .field("more", PrimitiveKind::U8.codec())
///         .field("next", Arc::new(next))
///         .build()
///         .unwrap(),
/// );
/// slot.bind(&node).unwrap();
///
/// let list = node.unpack(&[7, 1, 8, 0]).unwrap();
/// let tail = list.get("next").and_then(Value::as_record).unwrap();
/// assert_eq!(tail.get("value"), Some(&Value::UInt(8)));
/// assert_eq!(tail.get("next"), Some(&Value::Null));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaSlot {
    cell: Arc<OnceCell<Weak<Schema>>>,
}

impl SchemaSlot {
    /// An unbound slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the slot; a slot binds once
    pub fn bind(&self, schema: &Arc<Schema>) -> Result<()> {
        self.cell.set(Arc::downgrade(schema)).map_err(|_| {
            Error::InvalidSchema(format!(
                "schema slot already bound, cannot bind '{}'",
                schema.name()
            ))
        })
    }

    /// Whether [`SchemaSlot::bind`] has been called
    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The bound schema
    pub fn get(&self) -> Result<Arc<Schema>> {
        let weak = self
            .cell
            .get()
            .ok_or_else(|| Error::InvalidSchema("schema slot used before bind".to_string()))?;
        weak.upgrade()
            .ok_or_else(|| Error::InvalidSchema("schema behind slot was dropped".to_string()))
    }

    /// Codec resolving the slot on every call
    pub fn codec(&self) -> SharedCodec {
        Arc::new(SlotCodec {
            slot: self.clone(),
            last: SizeCell::default(),
        })
    }
}

#[derive(Clone)]
struct SlotCodec {
    slot: SchemaSlot,
    last: SizeCell,
}

impl fmt::Debug for SlotCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.slot.get().map(|s| s.name().to_string()).ok();
        f.debug_struct("SlotCodec").field("schema", &name).finish()
    }
}

impl Codec for SlotCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let schema = self.slot.get()?;
        let written = pack_nested(&schema, values, out)?;
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let (record, size) = self.slot.get()?.unpack_at(buf, offset)?;
        Ok(Unpacked::single(Value::Record(record), self.last.record(size)))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let (record, size) = self.slot.get()?.read_record(src)?;
        Ok(Unpacked::single(Value::Record(record), self.last.record(size)))
    }

    fn with_byte_order(&self, _order: ByteOrder) -> SharedCodec {
        self.slot.codec()
    }
}

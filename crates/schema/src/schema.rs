//! Record schemas
//!
//! A [`Schema`] is built once from an ordered list of field descriptors and
//! is immutable afterwards. Building applies the schema byte order to every
//! field codec and folds them with [`fold`], so adjacent primitive fields
//! merge into one layout.
//!
//! # Example
//!
//! ```
//! use structpack_codec::{ArrayCodec, Header, PrimitiveKind};
//! use structpack_core::{Record, Value};
//! use structpack_schema::{Schema, SchemaOptions};
//! use std::sync::Arc;
//!
//! let schema = Schema::builder("Blob")
//!     .options(SchemaOptions::little_endian())
//!     .field("count", PrimitiveKind::U32.codec())
//!     .field(
//!         "items",
//!         Arc::new(ArrayCodec::new(Header::field("count"), PrimitiveKind::U8.codec()).unwrap()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let record = Record::new()
//!     .with("count", 3u32)
//!     .with("items", vec![Value::UInt(1), Value::UInt(2), Value::UInt(3)]);
//! assert_eq!(schema.pack(&record).unwrap(), vec![3, 0, 0, 0, 1, 2, 3]);
//! ```

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use structpack_codec::{copy_into, fold, ByteSource, Codec, PrimitiveKind, SharedCodec};
use structpack_core::{ByteOrder, ByteOrderPolicy, Error, Record, RecordView, Result, Value};
use tracing::debug;

use crate::field::FieldDescriptor;
use crate::nested::NestedRecordCodec;
use crate::options::SchemaOptions;
use crate::patch::SchemaPatch;

/// Immutable record layout: fields, visible names and the folded codec
#[derive(Debug)]
pub struct Schema {
    name: String,
    options: SchemaOptions,
    fields: Vec<FieldDescriptor>,
    names: Vec<Arc<str>>,
    codec: SharedCodec,
}

impl Schema {
    /// Start building a schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build options
    pub fn options(&self) -> SchemaOptions {
        self.options
    }

    /// Byte order applied to every field
    pub fn byte_order(&self) -> ByteOrder {
        self.options.byte_order
    }

    /// Fields in declaration order, padding included
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Visible field names in declaration order
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    /// The folded whole-record codec
    pub fn record_codec(&self) -> &SharedCodec {
        &self.codec
    }

    /// Values packed and unpacked per record
    pub fn value_count(&self) -> usize {
        self.codec.value_count()
    }

    /// Byte length of the last completed pack or unpack
    ///
    /// Only meaningful right after a call on the same thread.
    pub fn last_size(&self) -> usize {
        self.codec.last_size()
    }

    /// Codec nesting this schema as a single `Value::Record`
    pub fn codec(self: &Arc<Self>) -> SharedCodec {
        Arc::new(NestedRecordCodec::new(Arc::clone(self)))
    }

    fn gather(&self, record: &Record) -> Result<Vec<Value>> {
        self.names
            .iter()
            .map(|name| {
                record.get(name).cloned().ok_or_else(|| Error::MissingField {
                    name: name.to_string(),
                })
            })
            .collect()
    }

    fn assemble(&self, values: Vec<Value>) -> Result<Record> {
        if values.len() != self.names.len() {
            return Err(Error::ShapeMismatch {
                what: "record value count",
                expected: self.names.len(),
                actual: values.len(),
            });
        }
        Ok(Record::from_pairs(
            self.names.iter().map(|n| n.to_string()).zip(values),
        ))
    }

    /// Append the packed record to `out`
    pub fn pack_to(&self, record: &Record, out: &mut Vec<u8>) -> Result<usize> {
        let values = self.gather(record)?;
        let ctx = RecordView::new(&self.names, &values);
        self.codec.pack_to(&ctx, &values, out)
    }

    /// Pack a record
    pub fn pack(&self, record: &Record) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.pack_to(record, &mut out)?;
        Ok(out)
    }

    /// Pack a record into `buf` at `offset`, returning the bytes written
    pub fn pack_into(&self, record: &Record, buf: &mut [u8], offset: usize) -> Result<usize> {
        let bytes = self.pack(record)?;
        copy_into(buf, offset, &bytes)
    }

    /// Pack a record to a stream
    pub fn pack_write(&self, record: &Record, out: &mut dyn Write) -> Result<usize> {
        let values = self.gather(record)?;
        let ctx = RecordView::new(&self.names, &values);
        self.codec.pack_write(&ctx, &values, out)
    }

    /// Unpack a record from `buf` at `offset`, with the bytes consumed
    pub fn unpack_at(&self, buf: &[u8], offset: usize) -> Result<(Record, usize)> {
        let ctx = RecordView::new(&self.names, &[]);
        let unpacked = self.codec.unpack_at(&ctx, buf, offset)?;
        Ok((self.assemble(unpacked.values)?, unpacked.size))
    }

    /// Unpack a record from the start of `buf`
    pub fn unpack(&self, buf: &[u8]) -> Result<Record> {
        Ok(self.unpack_at(buf, 0)?.0)
    }

    /// Unpack a record from `buf` at `offset`
    pub fn unpack_from(&self, buf: &[u8], offset: usize) -> Result<Record> {
        Ok(self.unpack_at(buf, offset)?.0)
    }

    /// Unpack a record from a stream, with the bytes consumed
    pub fn read_record(&self, src: &mut dyn ByteSource) -> Result<(Record, usize)> {
        let ctx = RecordView::new(&self.names, &[]);
        let unpacked = self.codec.unpack_read(&ctx, src)?;
        Ok((self.assemble(unpacked.values)?, unpacked.size))
    }

    /// Unpack a record from a stream
    pub fn unpack_read(&self, src: &mut dyn ByteSource) -> Result<Record> {
        Ok(self.read_record(src)?.0)
    }

    /// Derive a new schema from this one plus a patch list
    ///
    /// A byte order in `options` that differs from this schema's fails under
    /// [`ByteOrderPolicy::Strict`]; under `Override` every inherited field is
    /// rebuilt with the new order.
    pub fn extend(
        &self,
        name: impl Into<String>,
        options: SchemaOptions,
        patches: impl IntoIterator<Item = SchemaPatch>,
    ) -> Result<Schema> {
        let name = name.into();
        if options.byte_order != self.byte_order()
            && options.byte_order_policy == ByteOrderPolicy::Strict
        {
            return Err(Error::InvalidSchema(format!(
                "schema '{}' uses byte order {} but base '{}' uses {}",
                name,
                options.byte_order,
                self.name,
                self.byte_order()
            )));
        }

        let mut fields = self.fields.clone();
        let mut applied = 0;
        for patch in patches {
            patch.apply(&mut fields)?;
            applied += 1;
        }
        debug!(
            "Applied {} patches to '{}' deriving '{}'",
            applied, self.name, name
        );

        SchemaBuilder::new(name)
            .options(options)
            .descriptors(fields)
            .build()
    }
}

/// Collects field descriptors and builds a [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    options: SchemaOptions,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    /// Empty builder with default options
    pub fn new(name: impl Into<String>) -> Self {
        SchemaBuilder {
            name: name.into(),
            options: SchemaOptions::default(),
            fields: Vec::new(),
        }
    }

    /// Replace the options
    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Set only the byte order
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.options.byte_order = order;
        self
    }

    /// Add a named field
    pub fn field(mut self, name: impl Into<Arc<str>>, codec: SharedCodec) -> Self {
        self.fields.push(FieldDescriptor::named(name, codec));
        self
    }

    /// Add `n` padding bytes
    pub fn pad(mut self, n: usize) -> Self {
        let name = format!("_pad{}", self.fields.len());
        self.fields
            .push(FieldDescriptor::padding(name, PrimitiveKind::Pad(n).codec()));
        self
    }

    /// Add a field descriptor as is
    pub fn descriptor(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add several field descriptors
    pub fn descriptors(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Validate the fields and fold them into a schema
    pub fn build(self) -> Result<Schema> {
        let order = self.options.byte_order;
        let mut seen = HashSet::new();
        let last = self.fields.len().saturating_sub(1);
        for (idx, field) in self.fields.iter().enumerate() {
            // Padding names are never looked up by value
            if field.is_named() && !seen.insert(field.name()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field '{}' in '{}'",
                    field.name(),
                    self.name
                )));
            }
            let expected = usize::from(field.is_named());
            if field.codec().value_count() != expected {
                return Err(Error::InvalidSchema(format!(
                    "field '{}' must carry {} value(s), its codec carries {}",
                    field.name(),
                    expected,
                    field.codec().value_count()
                )));
            }
            if idx != last && field.codec().is_final() {
                return Err(Error::InvalidSchema(format!(
                    "field '{}' reads to end of input and must be the last field",
                    field.name()
                )));
            }
        }

        let fields: Vec<FieldDescriptor> = self
            .fields
            .iter()
            .map(|f| f.with_codec(f.codec().with_byte_order(order)))
            .collect();
        let codec = fold(fields.iter().map(|f| Arc::clone(f.codec())))?;
        let names: Vec<Arc<str>> = fields
            .iter()
            .filter(|f| f.is_named())
            .map(|f| Arc::clone(f.shared_name()))
            .collect();

        let parts = codec.as_compound().map_or(1, |c| c.parts().len());
        debug!(
            "Built schema '{}': {} fields, {} values, {} codec parts, byte order {}",
            self.name,
            fields.len(),
            codec.value_count(),
            parts,
            order
        );

        Ok(Schema {
            name: self.name,
            options: self.options,
            fields,
            names,
            codec,
        })
    }
}

//! Fixed-width primitive codecs
//!
//! A [`PrimitiveCodec`] is an ordered list of [`PrimitiveKind`] items laid
//! out under one [`ByteOrder`]. Composing two primitive codecs with the same
//! byte order merges their item lists, so the merged codec lays out the
//! concatenation exactly like one native "pack many scalars" call, including
//! the padding inserted between items under `NativeAligned`.
//!
//! ## Layout rules
//!
//! - Each item starts at the previous item's end, rounded up to the item's
//!   native alignment when the order is aligned.
//! - Byte blocks, Pascal strings, padding and bool align to 1.
//! - No trailing padding is added after the last item.

use std::mem::align_of;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};
use half::f16;
use smallvec::SmallVec;
use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::codec::{expect_values, read_exact, slice_at, ByteSource, Codec, SharedCodec, SizeCell, Unpacked};

/// One fixed-width item of a primitive layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// One byte, `0` or `1` on pack; any non-zero byte unpacks as `true`
    Bool,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 8-bit integer
    U8,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 64-bit integer
    U64,
    /// IEEE-754 half precision
    F16,
    /// IEEE-754 single precision
    F32,
    /// IEEE-754 double precision
    F64,
    /// Fixed block of `n` bytes: zero filled when short, truncated when long
    Bytes(usize),
    /// `n`-byte block whose first byte is the content length
    Pascal(usize),
    /// `n` zero bytes that carry no value
    Pad(usize),
}

impl PrimitiveKind {
    /// Encoded width in bytes
    pub fn size(self) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 | PrimitiveKind::F16 => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
            PrimitiveKind::Bytes(n) | PrimitiveKind::Pascal(n) | PrimitiveKind::Pad(n) => n,
        }
    }

    /// Alignment under `NativeAligned`
    pub fn native_align(self) -> usize {
        match self {
            PrimitiveKind::Bool
            | PrimitiveKind::I8
            | PrimitiveKind::U8
            | PrimitiveKind::Bytes(_)
            | PrimitiveKind::Pascal(_)
            | PrimitiveKind::Pad(_) => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 | PrimitiveKind::F16 => align_of::<u16>(),
            PrimitiveKind::I32 | PrimitiveKind::U32 => align_of::<u32>(),
            PrimitiveKind::F32 => align_of::<f32>(),
            PrimitiveKind::I64 | PrimitiveKind::U64 => align_of::<u64>(),
            PrimitiveKind::F64 => align_of::<f64>(),
        }
    }

    /// Values carried by one item (padding carries none)
    pub fn value_count(self) -> usize {
        match self {
            PrimitiveKind::Pad(_) => 0,
            _ => 1,
        }
    }

    /// Short wire type name
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "int8",
            PrimitiveKind::U8 => "uint8",
            PrimitiveKind::I16 => "int16",
            PrimitiveKind::U16 => "uint16",
            PrimitiveKind::I32 => "int32",
            PrimitiveKind::U32 => "uint32",
            PrimitiveKind::I64 => "int64",
            PrimitiveKind::U64 => "uint64",
            PrimitiveKind::F16 => "float16",
            PrimitiveKind::F32 => "float32",
            PrimitiveKind::F64 => "float64",
            PrimitiveKind::Bytes(_) => "bytes",
            PrimitiveKind::Pascal(_) => "pascal",
            PrimitiveKind::Pad(_) => "pad",
        }
    }

    /// Single-item codec under the default byte order
    pub fn codec(self) -> SharedCodec {
        Arc::new(PrimitiveCodec::new(self))
    }
}

/// Unsigned integer width used for counts, sizes and length prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UIntWidth {
    /// uint8
    U8,
    /// uint16
    U16,
    /// uint32
    U32,
    /// uint64
    U64,
}

impl UIntWidth {
    /// The matching primitive item
    pub fn kind(self) -> PrimitiveKind {
        match self {
            UIntWidth::U8 => PrimitiveKind::U8,
            UIntWidth::U16 => PrimitiveKind::U16,
            UIntWidth::U32 => PrimitiveKind::U32,
            UIntWidth::U64 => PrimitiveKind::U64,
        }
    }

    /// Largest representable value
    pub fn max(self) -> u64 {
        match self {
            UIntWidth::U8 => u8::MAX as u64,
            UIntWidth::U16 => u16::MAX as u64,
            UIntWidth::U32 => u32::MAX as u64,
            UIntWidth::U64 => u64::MAX,
        }
    }

    /// Check that `n` fits, as a value ready to pack
    pub fn fit(self, n: usize) -> Result<Value> {
        let n = n as u64;
        if n > self.max() {
            return Err(Error::OutOfRange {
                kind: self.kind().name(),
                value: n.to_string(),
            });
        }
        Ok(Value::UInt(n))
    }
}

/// A merged run of fixed-width items under one byte order
#[derive(Debug, Clone)]
pub struct PrimitiveCodec {
    items: SmallVec<[PrimitiveKind; 4]>,
    offsets: SmallVec<[usize; 4]>,
    order: ByteOrder,
    size: usize,
    value_count: usize,
    last: SizeCell,
}

impl PrimitiveCodec {
    /// Single item under the default byte order
    pub fn new(kind: PrimitiveKind) -> Self {
        Self::from_items([kind], ByteOrder::default())
    }

    /// Single item under `order`
    pub fn with_order(kind: PrimitiveKind, order: ByteOrder) -> Self {
        Self::from_items([kind], order)
    }

    /// Items laid out in order
    pub fn from_items<I>(items: I, order: ByteOrder) -> Self
    where
        I: IntoIterator<Item = PrimitiveKind>,
    {
        let items: SmallVec<[PrimitiveKind; 4]> = items.into_iter().collect();
        let mut offsets = SmallVec::with_capacity(items.len());
        let mut pos = 0;
        for item in &items {
            if order.is_aligned() {
                pos = align_up(pos, item.native_align());
            }
            offsets.push(pos);
            pos += item.size();
        }
        let value_count = items.iter().map(|k| k.value_count()).sum();
        PrimitiveCodec {
            items,
            offsets,
            order,
            size: pos,
            value_count,
            last: SizeCell::default(),
        }
    }

    /// Items in layout order
    pub fn items(&self) -> &[PrimitiveKind] {
        &self.items
    }

    /// Byte offset of each item
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Byte order of this layout
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Encoded size, known up front
    pub fn size(&self) -> usize {
        self.size
    }

    /// Layout of `self` followed by `other`, under `self`'s byte order
    pub fn join(&self, other: &PrimitiveCodec) -> PrimitiveCodec {
        debug_assert_eq!(self.order, other.order);
        let items = self.items.iter().chain(other.items.iter()).copied();
        PrimitiveCodec::from_items(items, self.order)
    }

    /// Layout of `n` consecutive copies of `self`
    pub fn repeated(&self, n: usize) -> PrimitiveCodec {
        let items = std::iter::repeat(self.items.iter().copied())
            .take(n)
            .flatten();
        PrimitiveCodec::from_items(items, self.order)
    }

    fn encode_all<E: Endian>(&self, values: &[Value], dst: &mut [u8]) -> Result<()> {
        let mut values = values.iter();
        for (kind, &offset) in self.items.iter().zip(&self.offsets) {
            if kind.value_count() == 0 {
                continue;
            }
            let value = values.next().ok_or(Error::ShapeMismatch {
                what: "primitive value count",
                expected: self.value_count,
                actual: 0,
            })?;
            encode_item::<E>(*kind, value, &mut dst[offset..offset + kind.size()])?;
        }
        Ok(())
    }

    fn decode_all<E: Endian>(&self, src: &[u8]) -> Vec<Value> {
        self.items
            .iter()
            .zip(&self.offsets)
            .filter(|(kind, _)| kind.value_count() > 0)
            .map(|(kind, &offset)| decode_item::<E>(*kind, &src[offset..offset + kind.size()]))
            .collect()
    }

    /// Encode into a zeroed slice of exactly `size()` bytes
    fn encode(&self, values: &[Value], dst: &mut [u8]) -> Result<()> {
        if self.order.is_little_endian() {
            self.encode_all::<LittleEndian>(values, dst)
        } else {
            self.encode_all::<BigEndian>(values, dst)
        }
    }

    fn decode(&self, src: &[u8]) -> Vec<Value> {
        if self.order.is_little_endian() {
            self.decode_all::<LittleEndian>(src)
        } else {
            self.decode_all::<BigEndian>(src)
        }
    }
}

impl Codec for PrimitiveCodec {
    fn value_count(&self) -> usize {
        self.value_count
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        expect_values("primitive value count", self.value_count, values)?;
        let start = out.len();
        out.resize(start + self.size, 0);
        if let Err(e) = self.encode(values, &mut out[start..]) {
            out.truncate(start);
            return Err(e);
        }
        Ok(self.last.record(self.size))
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let src = slice_at(buf, offset, self.size)?;
        let values = self.decode(src);
        Ok(Unpacked::new(values, self.last.record(self.size)))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let mut raw = vec![0u8; self.size];
        read_exact(src, &mut raw)?;
        let values = self.decode(&raw);
        Ok(Unpacked::new(values, self.last.record(self.size)))
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(PrimitiveCodec::from_items(self.items.iter().copied(), order))
    }

    fn as_primitive(&self) -> Option<&PrimitiveCodec> {
        Some(self)
    }
}

fn align_up(pos: usize, align: usize) -> usize {
    (pos + align - 1) / align * align
}

// ============================================================================
// Item encoding
// ============================================================================

fn integer(kind: PrimitiveKind, value: &Value, min: i128, max: i128) -> Result<i128> {
    let v = match value {
        Value::Int(i) => *i as i128,
        Value::UInt(u) => *u as i128,
        Value::Bool(b) => *b as i128,
        other => return Err(Error::invalid_value("integer", other)),
    };
    if v < min || v > max {
        return Err(Error::OutOfRange {
            kind: kind.name(),
            value: v.to_string(),
        });
    }
    Ok(v)
}

fn float(value: &Value) -> Result<f64> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::UInt(u) => Ok(*u as f64),
        other => Err(Error::invalid_value("float", other)),
    }
}

// Finite inputs that overflow the narrower float are rejected, not rounded to infinity.
fn narrow<T>(
    kind: PrimitiveKind,
    value: f64,
    cast: impl Fn(f64) -> T,
    widen: impl Fn(&T) -> f64,
) -> Result<T> {
    let narrowed = cast(value);
    if value.is_finite() && widen(&narrowed).is_infinite() {
        return Err(Error::OutOfRange {
            kind: kind.name(),
            value: value.to_string(),
        });
    }
    Ok(narrowed)
}

fn truthy(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::UInt(u) => Ok(*u != 0),
        other => Err(Error::invalid_value("bool", other)),
    }
}

fn raw_bytes(value: &Value) -> Result<&[u8]> {
    value
        .as_bytes()
        .ok_or_else(|| Error::invalid_value("Bytes", value))
}

macro_rules! bounded {
    ($kind:expr, $value:expr, $t:ty) => {
        integer($kind, $value, <$t>::MIN as i128, <$t>::MAX as i128)? as $t
    };
}

fn encode_item<E: Endian>(kind: PrimitiveKind, value: &Value, dst: &mut [u8]) -> Result<()> {
    match kind {
        PrimitiveKind::Bool => dst[0] = truthy(value)? as u8,
        PrimitiveKind::I8 => dst[0] = bounded!(kind, value, i8) as u8,
        PrimitiveKind::U8 => dst[0] = bounded!(kind, value, u8),
        PrimitiveKind::I16 => E::write_i16(dst, bounded!(kind, value, i16)),
        PrimitiveKind::U16 => E::write_u16(dst, bounded!(kind, value, u16)),
        PrimitiveKind::I32 => E::write_i32(dst, bounded!(kind, value, i32)),
        PrimitiveKind::U32 => E::write_u32(dst, bounded!(kind, value, u32)),
        PrimitiveKind::I64 => E::write_i64(dst, bounded!(kind, value, i64)),
        PrimitiveKind::U64 => E::write_u64(dst, bounded!(kind, value, u64)),
        PrimitiveKind::F16 => {
            let half = narrow(kind, float(value)?, f16::from_f64, |h: &f16| h.to_f64())?;
            E::write_u16(dst, half.to_bits())
        }
        PrimitiveKind::F32 => {
            let single = narrow(kind, float(value)?, |v| v as f32, |s: &f32| f64::from(*s))?;
            E::write_f32(dst, single)
        }
        PrimitiveKind::F64 => E::write_f64(dst, float(value)?),
        PrimitiveKind::Bytes(n) => {
            let bytes = raw_bytes(value)?;
            let len = bytes.len().min(n);
            dst[..len].copy_from_slice(&bytes[..len]);
        }
        PrimitiveKind::Pascal(n) => {
            let bytes = raw_bytes(value)?;
            if n > 0 {
                let len = bytes.len().min(n - 1).min(u8::MAX as usize);
                dst[0] = len as u8;
                dst[1..1 + len].copy_from_slice(&bytes[..len]);
            }
        }
        PrimitiveKind::Pad(_) => {}
    }
    Ok(())
}

fn decode_item<E: Endian>(kind: PrimitiveKind, src: &[u8]) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(src[0] != 0),
        PrimitiveKind::I8 => Value::Int(src[0] as i8 as i64),
        PrimitiveKind::U8 => Value::UInt(src[0] as u64),
        PrimitiveKind::I16 => Value::Int(E::read_i16(src) as i64),
        PrimitiveKind::U16 => Value::UInt(E::read_u16(src) as u64),
        PrimitiveKind::I32 => Value::Int(E::read_i32(src) as i64),
        PrimitiveKind::U32 => Value::UInt(E::read_u32(src) as u64),
        PrimitiveKind::I64 => Value::Int(E::read_i64(src)),
        PrimitiveKind::U64 => Value::UInt(E::read_u64(src)),
        PrimitiveKind::F16 => Value::Float(f16::from_bits(E::read_u16(src)).to_f64()),
        PrimitiveKind::F32 => Value::Float(E::read_f32(src) as f64),
        PrimitiveKind::F64 => Value::Float(E::read_f64(src)),
        PrimitiveKind::Bytes(_) => Value::Bytes(src.to_vec()),
        PrimitiveKind::Pascal(n) => {
            if n == 0 {
                return Value::Bytes(Vec::new());
            }
            let len = (src[0] as usize).min(n - 1);
            Value::Bytes(src[1..1 + len].to_vec())
        }
        PrimitiveKind::Pad(_) => Value::Null,
    }
}

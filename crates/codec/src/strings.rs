//! Byte string codecs
//!
//! | Codec | Boundary |
//! |-------|----------|
//! | `PrimitiveKind::Bytes(n)` | exactly `n` bytes (merges with neighbours) |
//! | `PrimitiveKind::Pascal(n)` | `n` bytes, first byte is the length |
//! | [`PrefixedBytesCodec`] | unsigned length prefix, then content |
//! | [`DotNetCodec`] | 1 or 2 byte 7-bit length marker, then content |
//! | [`TerminatedCodec`] | content up to a terminator byte |
//! | [`RemainingCodec`] | everything left; must be the last field |
//!
//! All of them pack and unpack `Value::Bytes`; wrap one in a
//! [`TextCodec`](crate::text::TextCodec) to work with strings.

use std::io::{self, Read};
use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::codec::{expect_values, read_exact, read_vec, slice_at, ByteSource, Codec, SharedCodec, SizeCell, Unpacked};
use crate::primitive::{PrimitiveCodec, UIntWidth};

fn single_bytes(values: &[Value]) -> Result<&[u8]> {
    expect_values("string value count", 1, values)?;
    values[0]
        .as_bytes()
        .ok_or_else(|| Error::invalid_value("Bytes", &values[0]))
}

// ============================================================================
// Length-prefixed
// ============================================================================

/// Content preceded by its byte length as an unsigned integer
#[derive(Debug, Clone)]
pub struct PrefixedBytesCodec {
    prefix: PrimitiveCodec,
    width: UIntWidth,
    last: SizeCell,
}

impl PrefixedBytesCodec {
    /// Length prefix of `width` under the default byte order
    pub fn new(width: UIntWidth) -> Self {
        Self::with_order(width, ByteOrder::default())
    }

    /// Length prefix of `width` under `order`
    pub fn with_order(width: UIntWidth, order: ByteOrder) -> Self {
        PrefixedBytesCodec {
            prefix: PrimitiveCodec::with_order(width.kind(), order),
            width,
            last: SizeCell::default(),
        }
    }
}

impl Codec for PrefixedBytesCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let bytes = single_bytes(values)?;
        let len = self.width.fit(bytes.len())?;
        let written = self.prefix.pack_to(ctx, &[len], out)?;
        out.extend_from_slice(bytes);
        Ok(self.last.record(written + bytes.len()))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let prefix = self.prefix.unpack_at(ctx, buf, offset)?;
        let len = content_len(&prefix.values)?;
        let content = slice_at(buf, offset + prefix.size, len)?;
        Ok(Unpacked::single(
            Value::Bytes(content.to_vec()),
            self.last.record(prefix.size + len),
        ))
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let prefix = self.prefix.unpack_read(ctx, src)?;
        let len = content_len(&prefix.values)?;
        let content = read_vec(src, len)?;
        Ok(Unpacked::single(
            Value::Bytes(content),
            self.last.record(prefix.size + len),
        ))
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(Self::with_order(self.width, order))
    }
}

fn content_len(prefix: &[Value]) -> Result<usize> {
    let n = prefix.first().and_then(Value::as_uint).unwrap_or(0);
    usize::try_from(n).map_err(|_| Error::OutOfRange {
        kind: "usize",
        value: n.to_string(),
    })
}

// ============================================================================
// .NET
// ============================================================================

/// .NET-style string: 7-bit encoded length, then content
///
/// Lengths below 128 take one byte. Longer ones take a little-endian `u16`
/// marker `0x80 | (len & 0x7F) | ((len & 0xFF80) << 1)`, which limits content
/// to `0x7FFF` bytes. The marker ignores the schema byte order.
#[derive(Debug, Clone, Default)]
pub struct DotNetCodec {
    last: SizeCell,
}

impl DotNetCodec {
    /// Longest encodable content
    pub const MAX_LEN: usize = 0x7FFF;

    /// Create the codec
    pub fn new() -> Self {
        Self::default()
    }

    fn encode_len(len: usize) -> Result<Vec<u8>> {
        if len < 0x80 {
            Ok(vec![len as u8])
        } else if len <= Self::MAX_LEN {
            let marker = 0x80 | (len & 0x7F) | ((len & 0xFF80) << 1);
            Ok((marker as u16).to_le_bytes().to_vec())
        } else {
            Err(Error::OutOfRange {
                kind: ".NET string length",
                value: len.to_string(),
            })
        }
    }

    fn decode_marker(lo: u8, hi: u8) -> usize {
        let marker = u16::from_le_bytes([lo, hi]) as usize;
        (marker & 0x7F) | ((marker >> 1) & 0xFF80)
    }
}

impl Codec for DotNetCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let bytes = single_bytes(values)?;
        let marker = Self::encode_len(bytes.len())?;
        out.extend_from_slice(&marker);
        out.extend_from_slice(bytes);
        Ok(self.last.record(marker.len() + bytes.len()))
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let first = slice_at(buf, offset, 1)?[0];
        let (len, marker) = if first < 0x80 {
            (first as usize, 1)
        } else {
            let pair = slice_at(buf, offset, 2)?;
            (Self::decode_marker(pair[0], pair[1]), 2)
        };
        let content = slice_at(buf, offset + marker, len)?;
        Ok(Unpacked::single(
            Value::Bytes(content.to_vec()),
            self.last.record(marker + len),
        ))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let mut first = [0u8; 1];
        read_exact(src, &mut first)?;
        let (len, marker) = if first[0] < 0x80 {
            (first[0] as usize, 1)
        } else {
            let mut hi = [0u8; 1];
            read_exact(src, &mut hi).map_err(|_| Error::truncated(2, 1))?;
            (Self::decode_marker(first[0], hi[0]), 2)
        };
        let content = read_vec(src, len)?;
        Ok(Unpacked::single(Value::Bytes(content), self.last.record(marker + len)))
    }

    fn with_byte_order(&self, _order: ByteOrder) -> SharedCodec {
        Arc::new(Self::new())
    }
}

// ============================================================================
// Terminated
// ============================================================================

/// Content ended by a single terminator byte
///
/// Pack appends the terminator unless the content already ends with it.
/// Unpack consumes the terminator but leaves it out of the value.
#[derive(Debug, Clone)]
pub struct TerminatedCodec {
    terminator: u8,
    last: SizeCell,
}

impl TerminatedCodec {
    /// Terminated by `terminator` (usually `0`)
    pub fn new(terminator: u8) -> Self {
        TerminatedCodec {
            terminator,
            last: SizeCell::default(),
        }
    }

    /// The terminator byte
    pub fn terminator(&self) -> u8 {
        self.terminator
    }
}

impl Codec for TerminatedCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let bytes = single_bytes(values)?;
        out.extend_from_slice(bytes);
        let mut written = bytes.len();
        if bytes.last() != Some(&self.terminator) {
            out.push(self.terminator);
            written += 1;
        }
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let rest = buf.get(offset..).unwrap_or_default();
        let end = rest
            .iter()
            .position(|&b| b == self.terminator)
            .ok_or(Error::UnterminatedString {
                terminator: self.terminator,
            })?;
        Ok(Unpacked::single(
            Value::Bytes(rest[..end].to_vec()),
            self.last.record(end + 1),
        ))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let mut content = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match src.read(&mut byte) {
                Ok(0) => {
                    return Err(Error::UnterminatedString {
                        terminator: self.terminator,
                    })
                }
                Ok(_) if byte[0] == self.terminator => break,
                Ok(_) => content.push(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let size = content.len() + 1;
        Ok(Unpacked::single(Value::Bytes(content), self.last.record(size)))
    }

    fn with_byte_order(&self, _order: ByteOrder) -> SharedCodec {
        Arc::new(Self::new(self.terminator))
    }
}

// ============================================================================
// Read to end
// ============================================================================

/// Everything left in the input
///
/// Has no boundary of its own, so composing anything after it is rejected.
#[derive(Debug, Clone, Default)]
pub struct RemainingCodec {
    last: SizeCell,
}

impl RemainingCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for RemainingCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, _ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let bytes = single_bytes(values)?;
        out.extend_from_slice(bytes);
        Ok(self.last.record(bytes.len()))
    }

    fn unpack_at(&self, _ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let rest = buf.get(offset..).unwrap_or_default();
        Ok(Unpacked::single(
            Value::Bytes(rest.to_vec()),
            self.last.record(rest.len()),
        ))
    }

    fn unpack_read(&self, _ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let mut rest = Vec::new();
        src.read_to_end(&mut rest)?;
        let size = rest.len();
        Ok(Unpacked::single(Value::Bytes(rest), self.last.record(size)))
    }

    fn with_byte_order(&self, _order: ByteOrder) -> SharedCodec {
        Arc::new(Self::new())
    }

    fn is_final(&self) -> bool {
        true
    }
}

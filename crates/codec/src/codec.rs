//! The codec capability and its I/O surfaces
//!
//! Every codec packs a fixed number of [`Value`]s into bytes and unpacks the
//! same number back. Three surfaces are supported:
//!
//! | Surface | Pack | Unpack |
//! |---------|------|--------|
//! | Owned bytes | [`Codec::pack`] | [`Codec::unpack`] |
//! | Buffer + offset | [`Codec::pack_into`] | [`Codec::unpack_from`] |
//! | Stream | [`Codec::write_to`] | [`Codec::read_from`] |
//!
//! The `*_to`/`*_at`/`*_write`/`*_read` methods take an explicit
//! [`RecordView`] so union deciders, conditional predicates and field
//! headers can see the enclosing record. The convenience methods pass an
//! empty view.
//!
//! ## `last_size`
//!
//! Each codec records the byte length of its most recently completed
//! operation. The value is stored in a relaxed atomic: it is only meaningful
//! immediately after a call returns on the calling thread, and concurrent use
//! of one codec instance from several threads makes it unreliable.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::compound::CompoundCodec;
use crate::primitive::PrimitiveCodec;

/// Codecs are shared between schemas and threads
pub type SharedCodec = Arc<dyn Codec>;

/// Result of an unpack: the decoded values and how many bytes they used
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    /// Decoded values, `value_count()` of them
    pub values: Vec<Value>,
    /// Bytes consumed
    pub size: usize,
}

impl Unpacked {
    /// Create a result
    pub fn new(values: Vec<Value>, size: usize) -> Self {
        Unpacked { values, size }
    }

    /// Single-value result
    pub fn single(value: Value, size: usize) -> Self {
        Unpacked {
            values: vec![value],
            size,
        }
    }
}

/// Pack/unpack capability
///
/// Implementations are immutable configuration apart from the diagnostic
/// size cell behind [`Codec::last_size`].
pub trait Codec: fmt::Debug + Send + Sync {
    /// Number of logical values packed and unpacked
    fn value_count(&self) -> usize;

    /// Byte length of the most recently completed operation
    fn last_size(&self) -> usize;

    /// Append the packed form of `values` to `out`, returning the bytes written
    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize>;

    /// Decode from `buf` starting at `offset`
    ///
    /// Input past the bytes this codec needs is ignored.
    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked>;

    /// Decode from the current position of a stream
    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked>;

    /// Same layout with a different byte order applied to every primitive
    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec;

    /// Whether this codec consumes all remaining input
    fn is_final(&self) -> bool {
        false
    }

    /// Whether this is the identity codec
    fn is_null(&self) -> bool {
        false
    }

    /// Downcast used by the compose algebra
    fn as_primitive(&self) -> Option<&PrimitiveCodec> {
        None
    }

    /// Downcast used by the compose algebra
    fn as_compound(&self) -> Option<&CompoundCodec> {
        None
    }

    /// Pack and write to a stream
    fn pack_write(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut dyn Write) -> Result<usize> {
        let mut buf = Vec::new();
        let written = self.pack_to(ctx, values, &mut buf)?;
        out.write_all(&buf)?;
        Ok(written)
    }

    /// Pack into a new byte vector
    fn pack(&self, values: &[Value]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.pack_to(&RecordView::empty(), values, &mut out)?;
        Ok(out)
    }

    /// Unpack from the start of `buf`
    fn unpack(&self, buf: &[u8]) -> Result<Vec<Value>> {
        Ok(self.unpack_at(&RecordView::empty(), buf, 0)?.values)
    }

    /// Pack into `buf` at `offset`, returning the bytes written
    fn pack_into(&self, buf: &mut [u8], offset: usize, values: &[Value]) -> Result<usize> {
        let bytes = self.pack(values)?;
        copy_into(buf, offset, &bytes)
    }

    /// Unpack from `buf` at `offset`
    fn unpack_from(&self, buf: &[u8], offset: usize) -> Result<Vec<Value>> {
        Ok(self.unpack_at(&RecordView::empty(), buf, offset)?.values)
    }

    /// Pack and write to a stream
    fn write_to(&self, out: &mut dyn Write, values: &[Value]) -> Result<usize> {
        self.pack_write(&RecordView::empty(), values, out)
    }

    /// Unpack from a stream
    fn read_from(&self, src: &mut dyn ByteSource) -> Result<Vec<Value>> {
        Ok(self.unpack_read(&RecordView::empty(), src)?.values)
    }
}

/// Copy packed bytes into a caller buffer at `offset`
pub fn copy_into(buf: &mut [u8], offset: usize, bytes: &[u8]) -> Result<usize> {
    let available = buf.len().saturating_sub(offset);
    if bytes.len() > available {
        return Err(Error::BufferTooSmall {
            needed: bytes.len(),
            available,
        });
    }
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

/// Check that a codec received exactly as many values as it declares
pub(crate) fn expect_values(what: &'static str, expected: usize, values: &[Value]) -> Result<()> {
    if values.len() != expected {
        return Err(Error::ShapeMismatch {
            what,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Size cell
// ============================================================================

/// Diagnostic byte count of the last completed operation
#[derive(Debug, Default)]
pub struct SizeCell(AtomicUsize);

impl SizeCell {
    /// Last recorded size
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Record a size and hand it back
    pub fn record(&self, size: usize) -> usize {
        self.0.store(size, Ordering::Relaxed);
        size
    }
}

impl Clone for SizeCell {
    fn clone(&self) -> Self {
        SizeCell(AtomicUsize::new(self.get()))
    }
}

// ============================================================================
// Byte sources
// ============================================================================

/// Readable, positionable input
///
/// Implemented for every `Read + Seek` type. Only union lookahead needs to
/// move the cursor backwards; everything else reads forward and asks for the
/// position at most.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek> ByteSource for T {}

/// Adapts a plain reader into a [`ByteSource`]
///
/// Position queries work. Any seek that would move the cursor fails, so a
/// lookahead union decoded from a pipe or socket errors instead of
/// mis-decoding.
#[derive(Debug)]
pub struct ForwardOnly<R> {
    inner: R,
    pos: u64,
}

impl<R: Read> ForwardOnly<R> {
    /// Wrap a reader positioned at logical offset 0
    pub fn new(inner: R) -> Self {
        ForwardOnly { inner, pos: 0 }
    }

    /// Bytes read so far
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Unwrap the reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ForwardOnly<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R> Seek for ForwardOnly<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(_) => None,
        };
        match target {
            Some(p) if p == self.pos => Ok(self.pos),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "forward-only source cannot seek",
            )),
        }
    }
}

/// Fill `buf` from the stream, reporting a short read as truncated input
pub(crate) fn read_exact(src: &mut dyn ByteSource, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::truncated(buf.len(), filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Read exactly `len` bytes without trusting `len` for the allocation
pub(crate) fn read_vec(src: &mut dyn ByteSource, len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    Read::take(&mut *src, len as u64).read_to_end(&mut out)?;
    if out.len() < len {
        return Err(Error::truncated(len, out.len()));
    }
    Ok(out)
}

/// Bytes left in the stream, or `None` when it cannot seek to its end
pub(crate) fn remaining_len(src: &mut dyn ByteSource) -> Option<u64> {
    let pos = src.stream_position().ok()?;
    let end = src.seek(SeekFrom::End(0)).ok()?;
    src.seek(SeekFrom::Start(pos)).ok()?;
    Some(end.saturating_sub(pos))
}

/// Borrow `len` bytes of `buf` from `offset`
pub(crate) fn slice_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let available = buf.len().saturating_sub(offset);
    if len > available {
        return Err(Error::truncated(len, available));
    }
    Ok(&buf[offset..offset + len])
}

//! Text over byte string codecs
//!
//! A [`TextCodec`] converts `Value::String` to bytes with a [`TextEncoding`]
//! and hands them to an inner byte string codec. Any size or length the
//! inner codec records refers to the encoded bytes, never to characters.
//! Trailing NUL characters are stripped after decoding, so zero-filled fixed
//! blocks read back as the original text.

use std::fmt;
use std::sync::Arc;

use structpack_core::{ByteOrder, Error, RecordView, Result, Value};

use crate::codec::{expect_values, ByteSource, Codec, SharedCodec, Unpacked};

/// Pluggable `str <-> bytes` transform
pub trait TextEncoding: Send + Sync {
    /// Encoding name for error messages
    fn name(&self) -> &'static str;

    /// Encode text
    fn encode(&self, text: &str) -> Result<Vec<u8>>;

    /// Decode bytes
    fn decode(&self, bytes: &[u8]) -> Result<String>;
}

/// UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl TextEncoding for Utf8 {
    fn name(&self) -> &'static str {
        "utf-8"
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Encoding {
            encoding: self.name(),
            message: e.to_string(),
        })
    }
}

/// 7-bit ASCII; anything else fails both ways
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii;

impl TextEncoding for Ascii {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match text.char_indices().find(|(_, c)| !c.is_ascii()) {
            Some((pos, c)) => Err(Error::Encoding {
                encoding: self.name(),
                message: format!("character {c:?} at position {pos} is not ASCII"),
            }),
            None => Ok(text.as_bytes().to_vec()),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        match bytes.iter().position(|b| !b.is_ascii()) {
            Some(pos) => Err(Error::Encoding {
                encoding: self.name(),
                message: format!("byte {:#04x} at position {pos} is not ASCII", bytes[pos]),
            }),
            None => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// ISO-8859-1: every byte maps to the code point of the same value
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl TextEncoding for Latin1 {
    fn name(&self) -> &'static str {
        "latin-1"
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        text.chars()
            .map(|c| {
                u8::try_from(c as u32).map_err(|_| Error::Encoding {
                    encoding: "latin-1",
                    message: format!("character {c:?} is outside Latin-1"),
                })
            })
            .collect()
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        Ok(bytes.iter().map(|&b| b as char).collect())
    }
}

/// Strings stored through a byte string codec
#[derive(Clone)]
pub struct TextCodec {
    inner: SharedCodec,
    encoding: Arc<dyn TextEncoding>,
}

impl TextCodec {
    /// Wrap a single-value byte string codec
    pub fn new(inner: SharedCodec, encoding: Arc<dyn TextEncoding>) -> Result<Self> {
        if inner.value_count() != 1 {
            return Err(Error::InvalidSchema(format!(
                "text needs a single-value byte codec, got {} values",
                inner.value_count()
            )));
        }
        Ok(TextCodec { inner, encoding })
    }

    /// UTF-8 text over `inner`
    pub fn utf8(inner: SharedCodec) -> Result<Self> {
        Self::new(inner, Arc::new(Utf8))
    }

    /// The byte codec underneath
    pub fn inner(&self) -> &SharedCodec {
        &self.inner
    }

    fn decode(&self, unpacked: Unpacked) -> Result<Unpacked> {
        let raw = unpacked
            .values
            .first()
            .and_then(Value::as_bytes)
            .ok_or(Error::InvalidValue {
                expected: "Bytes",
                actual: "non-bytes inner value",
            })?;
        let text = self.encoding.decode(raw)?;
        let text = text.trim_end_matches('\0').to_string();
        Ok(Unpacked::single(Value::String(text), unpacked.size))
    }
}

impl fmt::Debug for TextCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextCodec")
            .field("inner", &self.inner)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

impl Codec for TextCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.inner.last_size()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        expect_values("text value count", 1, values)?;
        let text = values[0]
            .as_str()
            .ok_or_else(|| Error::invalid_value("String", &values[0]))?;
        let encoded = Value::Bytes(self.encoding.encode(text)?);
        self.inner.pack_to(ctx, std::slice::from_ref(&encoded), out)
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        self.decode(self.inner.unpack_at(ctx, buf, offset)?)
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        self.decode(self.inner.unpack_read(ctx, src)?)
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(TextCodec {
            inner: self.inner.with_byte_order(order),
            encoding: Arc::clone(&self.encoding),
        })
    }

    fn is_final(&self) -> bool {
        self.inner.is_final()
    }
}

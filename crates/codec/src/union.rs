//! Tagged unions
//!
//! A union picks one codec per operation from a [`DecisionTable`].
//!
//! - [`LookbackCodec`]: a decider function looks at the record state (the
//!   whole record when packing, the fields decoded so far when unpacking)
//!   and returns the key.
//! - [`LookaheadCodec`]: unpacking first decodes a probe codec at the current
//!   position, rewinds, and uses the probed value as the key; the chosen codec
//!   then re-reads the probed bytes. Packing uses a decider like lookback.
//!
//! Rewinding a buffer is offset arithmetic. Rewinding a stream needs `Seek`;
//! the caller must hold the stream exclusively for the whole unpack call.

use std::fmt;
use std::io::{Seek, SeekFrom};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use structpack_core::{ByteOrder, Error, RecordView, Result, Value};
use tracing::trace;

use crate::codec::{ByteSource, Codec, SharedCodec, SizeCell, Unpacked};

/// Decides a union key from record state
pub type Decider = Arc<dyn Fn(&RecordView<'_>) -> Value + Send + Sync>;

/// Key to codec mapping with an optional fallback
#[derive(Clone, Default)]
pub struct DecisionTable {
    map: FxHashMap<Value, SharedCodec>,
    default: Option<SharedCodec>,
}

fn check_candidate(codec: &SharedCodec) -> Result<()> {
    if codec.value_count() != 1 {
        return Err(Error::InvalidSchema(format!(
            "union candidates must carry one value, got {}",
            codec.value_count()
        )));
    }
    Ok(())
}

impl DecisionTable {
    /// Empty table without a default
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`DecisionTable::insert`]
    pub fn with(mut self, key: impl Into<Value>, codec: SharedCodec) -> Result<Self> {
        self.insert(key, codec)?;
        Ok(self)
    }

    /// Map `key` to `codec`, replacing an earlier mapping
    pub fn insert(&mut self, key: impl Into<Value>, codec: SharedCodec) -> Result<()> {
        check_candidate(&codec)?;
        self.map.insert(key.into(), codec);
        Ok(())
    }

    /// Codec used for unmapped keys
    pub fn with_default(mut self, codec: SharedCodec) -> Result<Self> {
        check_candidate(&codec)?;
        self.default = Some(codec);
        Ok(self)
    }

    /// Codec for `key`
    pub fn resolve(&self, key: &Value) -> Result<&SharedCodec> {
        self.map
            .get(key)
            .or(self.default.as_ref())
            .ok_or_else(|| Error::UnresolvedVariant { key: key.clone() })
    }

    /// Number of mapped keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no keys are mapped
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fallback codec
    pub fn default_codec(&self) -> Option<&SharedCodec> {
        self.default.as_ref()
    }

    fn candidates(&self) -> impl Iterator<Item = &SharedCodec> {
        self.map.values().chain(self.default.iter())
    }

    fn with_byte_order(&self, order: ByteOrder) -> Self {
        DecisionTable {
            map: self
                .map
                .iter()
                .map(|(k, c)| (k.clone(), c.with_byte_order(order)))
                .collect(),
            default: self.default.as_ref().map(|c| c.with_byte_order(order)),
        }
    }
}

impl fmt::Debug for DecisionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionTable")
            .field("keys", &self.map.keys().collect::<Vec<_>>())
            .field("default", &self.default.is_some())
            .finish()
    }
}

// ============================================================================
// Lookback
// ============================================================================

/// Union keyed by a function of the record's known fields
#[derive(Clone)]
pub struct LookbackCodec {
    decider: Decider,
    table: DecisionTable,
    last: SizeCell,
}

impl LookbackCodec {
    /// Create from a decider and a table
    pub fn new<F>(decider: F, table: DecisionTable) -> Self
    where
        F: Fn(&RecordView<'_>) -> Value + Send + Sync + 'static,
    {
        LookbackCodec {
            decider: Arc::new(decider),
            table,
            last: SizeCell::default(),
        }
    }

    fn decide(&self, ctx: &RecordView<'_>) -> Result<&SharedCodec> {
        let key = (self.decider)(ctx);
        trace!(target: "structpack::union", strategy = "lookback", key = ?key, "decided");
        self.table.resolve(&key)
    }
}

impl fmt::Debug for LookbackCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookbackCodec")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Codec for LookbackCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let written = self.decide(ctx)?.pack_to(ctx, values, out)?;
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let unpacked = self.decide(ctx)?.unpack_at(ctx, buf, offset)?;
        self.last.record(unpacked.size);
        Ok(unpacked)
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let unpacked = self.decide(ctx)?.unpack_read(ctx, src)?;
        self.last.record(unpacked.size);
        Ok(unpacked)
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(LookbackCodec {
            decider: Arc::clone(&self.decider),
            table: self.table.with_byte_order(order),
            last: SizeCell::default(),
        })
    }

    fn is_final(&self) -> bool {
        self.table.candidates().any(|c| c.is_final())
    }
}

// ============================================================================
// Lookahead
// ============================================================================

/// Union keyed by a probe decoded ahead of the real value
#[derive(Clone)]
pub struct LookaheadCodec {
    probe: SharedCodec,
    decider: Decider,
    table: DecisionTable,
    last: SizeCell,
}

impl LookaheadCodec {
    /// Create from a probe codec, a pack-time decider and a table
    ///
    /// The probe's first value is the key.
    pub fn new<F>(probe: SharedCodec, decider: F, table: DecisionTable) -> Result<Self>
    where
        F: Fn(&RecordView<'_>) -> Value + Send + Sync + 'static,
    {
        if probe.value_count() == 0 {
            return Err(Error::InvalidSchema(
                "lookahead probe must produce a value".to_string(),
            ));
        }
        if probe.is_final() {
            return Err(Error::InvalidSchema(
                "lookahead probe cannot read to end of input".to_string(),
            ));
        }
        Ok(LookaheadCodec {
            probe,
            decider: Arc::new(decider),
            table,
            last: SizeCell::default(),
        })
    }

    fn key(probed: Unpacked) -> Value {
        probed.values.into_iter().next().unwrap_or(Value::Null)
    }
}

impl fmt::Debug for LookaheadCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookaheadCodec")
            .field("probe", &self.probe)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Codec for LookaheadCodec {
    fn value_count(&self) -> usize {
        1
    }

    fn last_size(&self) -> usize {
        self.last.get()
    }

    fn pack_to(&self, ctx: &RecordView<'_>, values: &[Value], out: &mut Vec<u8>) -> Result<usize> {
        let key = (self.decider)(ctx);
        trace!(target: "structpack::union", strategy = "lookahead", key = ?key, "decided for pack");
        let written = self.table.resolve(&key)?.pack_to(ctx, values, out)?;
        Ok(self.last.record(written))
    }

    fn unpack_at(&self, ctx: &RecordView<'_>, buf: &[u8], offset: usize) -> Result<Unpacked> {
        let probed = self.probe.unpack_at(&ctx.detached(), buf, offset)?;
        let probe_size = probed.size;
        let key = Self::key(probed);
        trace!(target: "structpack::union", strategy = "lookahead", key = ?key, probe_size, "probed");
        let unpacked = self.table.resolve(&key)?.unpack_at(ctx, buf, offset)?;
        self.last.record(unpacked.size);
        Ok(unpacked)
    }

    fn unpack_read(&self, ctx: &RecordView<'_>, src: &mut dyn ByteSource) -> Result<Unpacked> {
        let start = src.stream_position()?;
        let probed = self.probe.unpack_read(&ctx.detached(), src)?;
        src.seek(SeekFrom::Start(start))?;
        let probe_size = probed.size;
        let key = Self::key(probed);
        trace!(target: "structpack::union", strategy = "lookahead", key = ?key, probe_size, "probed and rewound");
        let unpacked = self.table.resolve(&key)?.unpack_read(ctx, src)?;
        self.last.record(unpacked.size);
        Ok(unpacked)
    }

    fn with_byte_order(&self, order: ByteOrder) -> SharedCodec {
        Arc::new(LookaheadCodec {
            probe: self.probe.with_byte_order(order),
            decider: Arc::clone(&self.decider),
            table: self.table.with_byte_order(order),
            last: SizeCell::default(),
        })
    }

    fn is_final(&self) -> bool {
        self.table.candidates().any(|c| c.is_final())
    }
}

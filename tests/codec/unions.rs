//! Lookback and lookahead unions, and conditional fields

use crate::common::{init_tracing, prim};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::sync::Arc;
use structpack_codec::{
    fold, Codec, ConditionalCodec, DecisionTable, ForwardOnly, LookaheadCodec, LookbackCodec,
    PrimitiveKind, SharedCodec, TupleCodec,
};
use structpack_core::{ByteOrder, Error, ErrorKind, RecordView, Value};

const LE: ByteOrder = ByteOrder::LittleEndian;

fn tagged(value_kind: PrimitiveKind) -> SharedCodec {
    Arc::new(TupleCodec::new([prim(PrimitiveKind::Bytes(4), LE), prim(value_kind, LE)]).unwrap())
}

fn chunk_union() -> LookaheadCodec {
    let table = DecisionTable::new()
        .with(&b"IINT"[..], tagged(PrimitiveKind::I32))
        .unwrap()
        .with(&b"FLOT"[..], tagged(PrimitiveKind::F32))
        .unwrap();
    LookaheadCodec::new(
        prim(PrimitiveKind::Bytes(4), LE),
        |view: &RecordView<'_>| view.get("tag").cloned().unwrap_or(Value::Null),
        table,
    )
    .unwrap()
}

fn chunk(tag: &[u8], value: Value) -> Value {
    Value::List(vec![Value::Bytes(tag.to_vec()), value])
}

#[test]
fn test_lookahead_from_buffer() {
    init_tracing();
    let union = chunk_union();
    let mut bytes = b"IINT".to_vec();
    bytes.extend_from_slice(&(-5i32).to_le_bytes());
    let u = union.unpack_at(&RecordView::empty(), &bytes, 0).unwrap();
    assert_eq!(u.values, vec![chunk(b"IINT", Value::Int(-5))]);
    assert_eq!(u.size, 8);
}

#[test]
fn test_lookahead_from_file_reads_each_variant() {
    init_tracing();
    let union = chunk_union();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"FLOT").unwrap();
    file.write_all(&2.5f32.to_le_bytes()).unwrap();
    file.write_all(b"IINT").unwrap();
    file.write_all(&7i32.to_le_bytes()).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let first = union.read_from(&mut file).unwrap();
    assert_eq!(first, vec![chunk(b"FLOT", Value::Float(2.5))]);
    assert_eq!(file.stream_position().unwrap(), 8);
    let second = union.read_from(&mut file).unwrap();
    assert_eq!(second, vec![chunk(b"IINT", Value::Int(7))]);
    assert_eq!(union.last_size(), 8);
}

#[test]
fn test_lookahead_unknown_tag() {
    let union = chunk_union();
    let err = union.unpack(b"ZZZZ\0\0\0\0").unwrap_err();
    assert!(err.is_unresolved_variant());
    match err {
        Error::UnresolvedVariant { key } => assert_eq!(key, Value::Bytes(b"ZZZZ".to_vec())),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_lookahead_needs_seekable_stream() {
    let union = chunk_union();
    let bytes = b"IINT\x01\0\0\0".to_vec();
    let err = union.read_from(&mut ForwardOnly::new(&bytes[..])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_lookahead_pack_uses_decider() {
    let union: SharedCodec = Arc::new(chunk_union());
    let record = fold([prim(PrimitiveKind::Bytes(4), LE), union]).unwrap();
    let names: Vec<Arc<str>> = vec![Arc::from("tag"), Arc::from("chunk")];
    let values = vec![
        Value::Bytes(b"IINT".to_vec()),
        chunk(b"IINT", Value::Int(1)),
    ];
    let mut out = Vec::new();
    record
        .pack_to(&RecordView::new(&names, &values), &values, &mut out)
        .unwrap();
    assert_eq!(out, b"IINTIINT\x01\0\0\0".to_vec());
}

fn shape_union() -> SharedCodec {
    let table = DecisionTable::new()
        .with(1u8, prim(PrimitiveKind::U8, LE))
        .unwrap()
        .with(2u8, prim(PrimitiveKind::U32, LE))
        .unwrap()
        .with_default(prim(PrimitiveKind::Bytes(2), LE))
        .unwrap();
    Arc::new(LookbackCodec::new(
        |view: &RecordView<'_>| view.get("kind").cloned().unwrap_or(Value::Null),
        table,
    ))
}

#[test]
fn test_lookback_sees_decoded_prefix() {
    let record = fold([prim(PrimitiveKind::U8, LE), shape_union()]).unwrap();
    let names: Vec<Arc<str>> = vec![Arc::from("kind"), Arc::from("body")];
    let ctx = RecordView::new(&names, &[]);

    let small = record.unpack_at(&ctx, &[1, 9], 0).unwrap();
    assert_eq!(small.values, vec![Value::UInt(1), Value::UInt(9)]);

    let wide = record.unpack_at(&ctx, &[2, 9, 0, 0, 0], 0).unwrap();
    assert_eq!(wide.values, vec![Value::UInt(2), Value::UInt(9)]);

    let fallback = record
        .unpack_read(&ctx, &mut Cursor::new(vec![7u8, 0xAB, 0xCD]))
        .unwrap();
    assert_eq!(
        fallback.values,
        vec![Value::UInt(7), Value::Bytes(vec![0xAB, 0xCD])]
    );
}

#[test]
fn test_lookback_without_context_is_unresolved() {
    let table = DecisionTable::new()
        .with(1u8, prim(PrimitiveKind::U8, LE))
        .unwrap();
    let union = LookbackCodec::new(
        |view: &RecordView<'_>| view.get("kind").cloned().unwrap_or(Value::Null),
        table,
    );
    let err = union.unpack(&[1]).unwrap_err();
    assert!(matches!(err, Error::UnresolvedVariant { key: Value::Null }));
}

#[test]
fn test_union_candidates_carry_one_value() {
    let two = fold([prim(PrimitiveKind::U8, LE), prim(PrimitiveKind::U8, LE)]).unwrap();
    let err = DecisionTable::new().with(1u8, two).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}

#[test]
fn test_conditional_field_on_stream() {
    let flags = prim(PrimitiveKind::U8, LE);
    let extra: SharedCodec = Arc::new(
        ConditionalCodec::new(
            prim(PrimitiveKind::U16, LE),
            |view: &RecordView<'_>| {
                view.get("flags")
                    .and_then(Value::as_uint)
                    .map_or(false, |f| f & 1 == 1)
            },
            0u16,
        )
        .unwrap(),
    );
    let tail = prim(PrimitiveKind::U8, LE);
    let record = fold([flags, extra, tail]).unwrap();
    let names: Vec<Arc<str>> = vec![Arc::from("flags"), Arc::from("extra"), Arc::from("tail")];
    let ctx = RecordView::new(&names, &[]);

    let with = record
        .unpack_read(&ctx, &mut Cursor::new(vec![1u8, 0x34, 0x12, 9]))
        .unwrap();
    assert_eq!(with.values, vec![Value::UInt(1), Value::UInt(0x1234), Value::UInt(9)]);
    assert_eq!(with.size, 4);

    let without = record
        .unpack_read(&ctx, &mut Cursor::new(vec![0u8, 9]))
        .unwrap();
    assert_eq!(without.values, vec![Value::UInt(0), Value::UInt(0), Value::UInt(9)]);
    assert_eq!(without.size, 2);
}

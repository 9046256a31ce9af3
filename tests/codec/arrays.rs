//! Arrays over buffers and streams

use crate::common::{init_tracing, prim};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::sync::Arc;
use structpack_codec::{
    ArrayCodec, Codec, ForwardOnly, Header, PrefixedBytesCodec, PrimitiveKind, SharedCodec,
    TupleCodec, UIntWidth,
};
use structpack_core::{ByteOrder, ErrorKind, Value};

fn uints(items: &[u64]) -> Value {
    Value::List(items.iter().map(|&n| Value::UInt(n)).collect())
}

fn prefixed(width: UIntWidth, element: SharedCodec) -> ArrayCodec {
    ArrayCodec::new(Header::prefixed(width), element).unwrap()
}

#[test]
fn test_array_of_arrays() {
    init_tracing();
    let inner: SharedCodec = Arc::new(prefixed(
        UIntWidth::U8,
        prim(PrimitiveKind::U16, ByteOrder::BigEndian),
    ));
    let outer = prefixed(UIntWidth::U8, inner);
    let value = Value::List(vec![uints(&[1, 2]), uints(&[]), uints(&[3])]);

    let bytes = outer.pack(&[value.clone()]).unwrap();
    assert_eq!(bytes, vec![3, 2, 0, 1, 0, 2, 0, 1, 0, 3]);
    assert_eq!(outer.unpack(&bytes).unwrap(), vec![value.clone()]);
    assert_eq!(outer.read_from(&mut Cursor::new(bytes)).unwrap(), vec![value]);
}

#[test]
fn test_array_of_tuples() {
    let pair: SharedCodec = Arc::new(
        TupleCodec::new([
            prim(PrimitiveKind::U8, ByteOrder::LittleEndian),
            prim(PrimitiveKind::I16, ByteOrder::LittleEndian),
        ])
        .unwrap(),
    );
    let array = ArrayCodec::new(Header::fixed(2), pair).unwrap();
    let value = Value::List(vec![
        Value::List(vec![Value::UInt(1), Value::Int(-1)]),
        Value::List(vec![Value::UInt(2), Value::Int(2)]),
    ]);
    let bytes = array.pack(&[value.clone()]).unwrap();
    assert_eq!(bytes, vec![1, 0xFF, 0xFF, 2, 2, 0]);
    assert_eq!(array.unpack(&bytes).unwrap(), vec![value]);
}

#[test]
fn test_fixed_checked_header_writes_size_only() {
    let element: SharedCodec = Arc::new(PrefixedBytesCodec::new(UIntWidth::U8));
    let array = ArrayCodec::new(Header::fixed_checked(2, UIntWidth::U16), element).unwrap();
    let value = Value::List(vec![Value::from(&b"a"[..]), Value::from(&b"bc"[..])]);
    let array = array.with_byte_order(ByteOrder::LittleEndian);
    let bytes = array.pack(&[value.clone()]).unwrap();
    assert_eq!(bytes, vec![5, 0, 1, b'a', 2, b'b', b'c']);
    assert_eq!(array.unpack(&bytes).unwrap(), vec![value]);
}

#[test]
fn test_count_prefix_overflow() {
    let array = prefixed(UIntWidth::U8, prim(PrimitiveKind::U8, ByteOrder::LittleEndian));
    let too_many = Value::List(vec![Value::UInt(0); 256]);
    let err = array.pack(&[too_many]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_truncated_elements() {
    let array = prefixed(UIntWidth::U16, prim(PrimitiveKind::U32, ByteOrder::BigEndian));
    let bytes = vec![0, 2, 0, 0, 0, 1, 0, 0];
    assert!(array.unpack(&bytes).unwrap_err().is_truncated());
    assert!(array.read_from(&mut Cursor::new(bytes)).unwrap_err().is_truncated());
}

#[test]
fn test_forward_only_stream() {
    let array = prefixed(UIntWidth::U8, prim(PrimitiveKind::U16, ByteOrder::LittleEndian));
    let bytes = vec![2, 1, 0, 2, 0, 0xEE];
    let mut src = ForwardOnly::new(&bytes[..]);
    assert_eq!(array.read_from(&mut src).unwrap(), vec![uints(&[1, 2])]);
    assert_eq!(src.position(), 5);
}

#[test]
fn test_consecutive_reads_from_file() {
    let array = prefixed(UIntWidth::U8, prim(PrimitiveKind::U8, ByteOrder::LittleEndian));
    let mut file = tempfile::tempfile().unwrap();
    array.write_to(&mut file, &[uints(&[1, 2, 3])]).unwrap();
    array.write_to(&mut file, &[uints(&[4])]).unwrap();
    file.flush().unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    assert_eq!(array.read_from(&mut file).unwrap(), vec![uints(&[1, 2, 3])]);
    assert_eq!(array.read_from(&mut file).unwrap(), vec![uints(&[4])]);
    assert!(array.read_from(&mut file).unwrap_err().is_truncated());
}

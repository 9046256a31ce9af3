//! Byte strings and text

use crate::common::prim;
use std::io::Cursor;
use std::sync::Arc;
use structpack_codec::{
    fold, Codec, DotNetCodec, Latin1, PrefixedBytesCodec, PrimitiveKind, RemainingCodec,
    SharedCodec, TerminatedCodec, TextCodec, UIntWidth,
};
use structpack_core::{ByteOrder, Error, ErrorKind, Value};

fn text(inner: SharedCodec) -> TextCodec {
    TextCodec::utf8(inner).unwrap()
}

#[test]
fn test_terminated_leaves_trailing_bytes() {
    let codec = TerminatedCodec::new(0);
    let u = codec
        .unpack_at(&structpack_core::RecordView::empty(), &[0x41, 0x42, 0x00, 0xFF], 0)
        .unwrap();
    assert_eq!(u.values, vec![Value::Bytes(b"AB".to_vec())]);
    assert_eq!(u.size, 3);

    let mut src = Cursor::new(vec![0x41, 0x42, 0x00, 0xFF]);
    codec.read_from(&mut src).unwrap();
    assert_eq!(src.position(), 3);
}

#[test]
fn test_unterminated_input() {
    let codec = TerminatedCodec::new(b'\n');
    let err = codec.unpack(b"no newline").unwrap_err();
    assert!(matches!(err, Error::UnterminatedString { terminator: b'\n' }));
    assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    assert!(codec.read_from(&mut Cursor::new(b"abc".to_vec())).is_err());
}

#[test]
fn test_text_in_fixed_block_strips_nuls() {
    let codec = text(prim(PrimitiveKind::Bytes(8), ByteOrder::LittleEndian));
    let bytes = codec.pack(&[Value::from("hi")]).unwrap();
    assert_eq!(bytes, b"hi\0\0\0\0\0\0".to_vec());
    assert_eq!(codec.unpack(&bytes).unwrap(), vec![Value::from("hi")]);
}

#[test]
fn test_text_length_counts_encoded_bytes() {
    let codec = text(Arc::new(PrefixedBytesCodec::with_order(
        UIntWidth::U16,
        ByteOrder::BigEndian,
    )));
    let bytes = codec.pack(&[Value::from("né")]).unwrap();
    assert_eq!(bytes, vec![0, 3, b'n', 0xC3, 0xA9]);
    assert_eq!(codec.unpack(&bytes).unwrap(), vec![Value::from("né")]);
}

#[test]
fn test_latin1_text() {
    let codec = TextCodec::new(Arc::new(TerminatedCodec::new(0)), Arc::new(Latin1)).unwrap();
    let bytes = codec.pack(&[Value::from("né")]).unwrap();
    assert_eq!(bytes, vec![b'n', 0xE9, 0]);
    assert_eq!(codec.unpack(&bytes).unwrap(), vec![Value::from("né")]);
    let err = codec.pack(&[Value::from("€")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
}

#[test]
fn test_invalid_utf8_on_unpack() {
    let codec = text(Arc::new(TerminatedCodec::new(0)));
    let err = codec.unpack(&[0xFF, 0xFE, 0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
}

#[test]
fn test_dotnet_long_string() {
    let codec = DotNetCodec::new();
    let content = vec![b'x'; 300];
    let bytes = codec.pack(&[Value::Bytes(content.clone())]).unwrap();
    assert_eq!(bytes.len(), 302);
    assert_eq!(codec.unpack(&bytes).unwrap(), vec![Value::Bytes(content.clone())]);
    assert_eq!(
        codec.read_from(&mut Cursor::new(bytes)).unwrap(),
        vec![Value::Bytes(content)]
    );

    let too_long = Value::Bytes(vec![0; DotNetCodec::MAX_LEN + 1]);
    assert_eq!(codec.pack(&[too_long]).unwrap_err().kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_remaining_must_come_last() {
    let rest: SharedCodec = Arc::new(RemainingCodec::new());
    let head = prim(PrimitiveKind::U8, ByteOrder::LittleEndian);
    let ok = fold([head.clone(), rest.clone()]).unwrap();
    assert!(ok.is_final());
    assert_eq!(
        ok.unpack(&[1, 2, 3]).unwrap(),
        vec![Value::UInt(1), Value::Bytes(vec![2, 3])]
    );
    let err = fold([rest, head]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}

//! Reference record layouts

use crate::common::{hex, init_tracing};
use proptest::prelude::*;
use std::io::Cursor;
use std::sync::Arc;
use structpack::prelude::*;

fn counted_items() -> Schema {
    Schema::builder("CountedItems")
        .options(SchemaOptions::little_endian())
        .field("count", PrimitiveKind::U32.codec())
        .field(
            "items",
            Arc::new(ArrayCodec::new(Header::field("count"), PrimitiveKind::U8.codec()).unwrap()),
        )
        .build()
        .unwrap()
}

fn u8_list(items: &[u8]) -> Value {
    Value::List(items.iter().map(|&b| Value::UInt(b as u64)).collect())
}

#[test]
fn test_count_field_drives_array() {
    init_tracing();
    let schema = counted_items();
    let record = Record::new().with("count", 3u32).with("items", u8_list(&[1, 2, 3]));
    let bytes = schema.pack(&record).unwrap();
    assert_eq!(hex(&bytes), "03 00 00 00 01 02 03");

    let back = schema.unpack(&bytes).unwrap();
    assert_eq!(back.get("count"), Some(&Value::UInt(3)));
    assert_eq!(back.get("items"), Some(&u8_list(&[1, 2, 3])));
}

#[test]
fn test_count_field_truncated_input() {
    let schema = counted_items();
    let err = schema.unpack(&[5, 0, 0, 0, 1, 2]).unwrap_err();
    assert!(err.is_truncated());
}

/// `count: u8, size: u8, items: blob[u8][count]` with both header values in fields
fn sized_blobs() -> Schema {
    Schema::builder("SizedBlobs")
        .options(SchemaOptions::network())
        .field("count", PrimitiveKind::U8.codec())
        .field("size", PrimitiveKind::U8.codec())
        .field(
            "items",
            Arc::new(
                ArrayCodec::new(
                    Header::field_checked("count", "size"),
                    Arc::new(PrefixedBytesCodec::new(UIntWidth::U8)),
                )
                .unwrap(),
            ),
        )
        .build()
        .unwrap()
}

#[test]
fn test_count_and_size_fields_checked() {
    init_tracing();
    let schema = sized_blobs();
    let items = Value::List(vec![Value::from(&b"ab"[..]), Value::from(&b"c"[..])]);
    let record = Record::new()
        .with("count", 2u8)
        .with("size", 5u8)
        .with("items", items.clone());

    let bytes = schema.pack(&record).unwrap();
    assert_eq!(bytes, vec![2, 5, 2, b'a', b'b', 1, b'c']);
    assert_eq!(schema.unpack(&bytes).unwrap(), record);
    assert_eq!(schema.unpack_read(&mut Cursor::new(bytes)).unwrap(), record);

    let wrong_size = Record::new()
        .with("count", 2u8)
        .with("size", 4u8)
        .with("items", items);
    let err = schema.pack(&wrong_size).unwrap_err();
    assert!(err.is_shape_mismatch());
    assert!(err.to_string().contains("array data size"));

    let declared_six = [2, 6, 2, b'a', b'b', 1, b'c', 0];
    let err = schema.unpack(&declared_six).unwrap_err();
    assert!(err.is_shape_mismatch());
    assert!(err.to_string().contains("array data size"));
    let err = schema
        .unpack_read(&mut Cursor::new(declared_six.to_vec()))
        .unwrap_err();
    assert!(err.is_shape_mismatch());
}

#[test]
fn test_terminated_string_then_next_field() {
    let schema = Schema::builder("Tagged")
        .options(SchemaOptions::network())
        .field(
            "name",
            Arc::new(TextCodec::utf8(Arc::new(TerminatedCodec::new(0))).unwrap()),
        )
        .field("marker", PrimitiveKind::U8.codec())
        .build()
        .unwrap();

    let name_only = TextCodec::utf8(Arc::new(TerminatedCodec::new(0))).unwrap();
    assert_eq!(name_only.pack(&[Value::from("AB")]).unwrap(), vec![0x41, 0x42, 0x00]);

    let record = schema.unpack(&[0x41, 0x42, 0x00, 0xFF]).unwrap();
    assert_eq!(record.get("name"), Some(&Value::from("AB")));
    assert_eq!(record.get("marker"), Some(&Value::UInt(0xFF)));
    assert_eq!(schema.last_size(), 4);
}

/// `a: i16, b: blob[u8], c: i32, d: i32` under native alignment
fn blob_record() -> Schema {
    Schema::builder("Base")
        .field("a", PrimitiveKind::I16.codec())
        .field("b", Arc::new(PrefixedBytesCodec::new(UIntWidth::U8)))
        .field("c", PrimitiveKind::I32.codec())
        .field("d", PrimitiveKind::I32.codec())
        .build()
        .unwrap()
}

#[test]
fn test_chained_parts_on_every_surface() {
    let schema = blob_record();
    let parts = schema.record_codec().as_compound().unwrap().parts().len();
    assert_eq!(parts, 3);

    let record = Record::new()
        .with("a", 10i16)
        .with("b", &b"a"[..])
        .with("c", 42i32)
        .with("d", 11i32);
    let bytes = schema.pack(&record).unwrap();
    let mut expected = 10i16.to_ne_bytes().to_vec();
    expected.extend_from_slice(&[1, b'a']);
    expected.extend_from_slice(&42i32.to_ne_bytes());
    expected.extend_from_slice(&11i32.to_ne_bytes());
    assert_eq!(bytes, expected);
    assert_eq!(schema.unpack(&bytes).unwrap(), record);

    let mut buffer = vec![0u8; bytes.len()];
    schema.pack_into(&record, &mut buffer, 0).unwrap();
    assert_eq!(buffer, bytes);
    assert_eq!(schema.unpack_from(&buffer, 0).unwrap(), record);

    let mut stream = Vec::new();
    schema.pack_write(&record, &mut stream).unwrap();
    assert_eq!(stream, bytes);
    assert_eq!(schema.unpack_read(&mut Cursor::new(stream)).unwrap(), record);
    assert_eq!(schema.last_size(), bytes.len());
}

#[test]
fn test_pack_into_small_buffer() {
    let schema = blob_record();
    let record = Record::new()
        .with("a", 1i16)
        .with("b", &b""[..])
        .with("c", 2i32)
        .with("d", 3i32);
    let mut buffer = [0u8; 4];
    let err = schema.pack_into(&record, &mut buffer, 0).unwrap_err();
    assert!(err.is_truncated());
    assert_eq!(buffer, [0u8; 4]);
}

#[test]
fn test_union_field_decided_by_earlier_field() {
    let table = DecisionTable::new()
        .with(1u8, PrimitiveKind::U16.codec())
        .unwrap()
        .with(2u8, Arc::new(TextCodec::utf8(Arc::new(TerminatedCodec::new(0))).unwrap()))
        .unwrap();
    let body = LookbackCodec::new(
        |view: &RecordView<'_>| view.get("kind").cloned().unwrap_or(Value::Null),
        table,
    );
    let schema = Schema::builder("Message")
        .options(SchemaOptions::big_endian())
        .field("kind", PrimitiveKind::U8.codec())
        .field("body", Arc::new(body))
        .build()
        .unwrap();

    let number = Record::new().with("kind", 1u8).with("body", 513u16);
    assert_eq!(schema.pack(&number).unwrap(), vec![1, 2, 1]);
    let text = Record::new().with("kind", 2u8).with("body", "hey");
    let bytes = schema.pack(&text).unwrap();
    assert_eq!(bytes, vec![2, b'h', b'e', b'y', 0]);
    assert_eq!(schema.unpack(&bytes).unwrap(), text);

    let err = schema.unpack(&[3, 0]).unwrap_err();
    assert!(err.is_unresolved_variant());
}

#[test]
fn test_conditional_field_by_version() {
    let schema = Schema::builder("Versioned")
        .options(SchemaOptions::little_endian())
        .field("version", PrimitiveKind::U8.codec())
        .field(
            "checksum",
            Arc::new(
                ConditionalCodec::new(
                    PrimitiveKind::U32.codec(),
                    |view: &RecordView<'_>| {
                        view.get("version").and_then(Value::as_uint) >= Some(2)
                    },
                    0u32,
                )
                .unwrap(),
            ),
        )
        .field("payload", Arc::new(RemainingCodec::new()))
        .build()
        .unwrap();

    let v1 = Record::new()
        .with("version", 1u8)
        .with("checksum", 0u32)
        .with("payload", &b"xy"[..]);
    assert_eq!(schema.pack(&v1).unwrap(), vec![1, b'x', b'y']);
    assert_eq!(schema.unpack(&[1, b'x', b'y']).unwrap(), v1);

    let v2 = Record::new()
        .with("version", 2u8)
        .with("checksum", 0xAABBCCDDu32)
        .with("payload", &b"z"[..]);
    let bytes = schema.pack(&v2).unwrap();
    assert_eq!(bytes, vec![2, 0xDD, 0xCC, 0xBB, 0xAA, b'z']);
    assert_eq!(schema.unpack(&bytes).unwrap(), v2);
}

fn header_strategy() -> impl Strategy<Value = Record> {
    (any::<u16>(), any::<i32>(), any::<bool>(), prop::collection::vec(any::<u8>(), 0..16))
        .prop_map(|(id, delta, flag, data)| {
            Record::new()
                .with("id", id)
                .with("delta", delta)
                .with("flag", flag)
                .with("data", data)
        })
}

proptest! {
    #[test]
    fn prop_record_roundtrip(record in header_strategy(), order_idx in 0usize..5) {
        let order = [
            ByteOrder::NativeAligned,
            ByteOrder::Native,
            ByteOrder::LittleEndian,
            ByteOrder::BigEndian,
            ByteOrder::Network,
        ][order_idx];
        let schema = Schema::builder("Roundtrip")
            .byte_order(order)
            .field("id", PrimitiveKind::U16.codec())
            .field("delta", PrimitiveKind::I32.codec())
            .field("flag", PrimitiveKind::Bool.codec())
            .field("data", Arc::new(PrefixedBytesCodec::new(UIntWidth::U16)))
            .build()
            .unwrap();

        let bytes = schema.pack(&record).unwrap();
        prop_assert_eq!(schema.unpack(&bytes).unwrap(), record.clone());
        let mut stream = Cursor::new(bytes.clone());
        prop_assert_eq!(schema.unpack_read(&mut stream).unwrap(), record);
        prop_assert_eq!(stream.position() as usize, bytes.len());
    }
}

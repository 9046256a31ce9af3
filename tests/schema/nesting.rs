//! Nested and recursive records

use crate::common::init_tracing;
use std::io::Cursor;
use std::sync::Arc;
use structpack::prelude::*;

fn chunk_header() -> Arc<Schema> {
    Arc::new(
        Schema::builder("ChunkHeader")
            .options(SchemaOptions::little_endian())
            .field("sig", PrimitiveKind::Bytes(4).codec())
            .field("size", PrimitiveKind::U32.codec())
            .build()
            .unwrap(),
    )
}

#[test]
fn test_nested_header_drives_union() {
    init_tracing();
    let header = chunk_header();
    let table = DecisionTable::new()
        .with(&b"IINT"[..], PrimitiveKind::I32.codec())
        .unwrap()
        .with(&b"STR "[..], Arc::new(TextCodec::utf8(Arc::new(RemainingCodec::new())).unwrap()))
        .unwrap();
    let body = LookbackCodec::new(
        |view: &RecordView<'_>| view.get_path("header.sig").cloned().unwrap_or(Value::Null),
        table,
    );
    let chunk = Schema::builder("Chunk")
        .options(SchemaOptions::little_endian())
        .field("header", header.codec())
        .field("body", Arc::new(body))
        .build()
        .unwrap();

    let record = Record::new()
        .with(
            "header",
            Record::new().with("sig", &b"IINT"[..]).with("size", 4u32),
        )
        .with("body", -2i32);
    let bytes = chunk.pack(&record).unwrap();
    assert_eq!(bytes, b"IINT\x04\0\0\0\xFE\xFF\xFF\xFF".to_vec());
    assert_eq!(chunk.unpack(&bytes).unwrap(), record);

    let text = Record::new()
        .with(
            "header",
            Record::new().with("sig", &b"STR "[..]).with("size", 5u32),
        )
        .with("body", "hello");
    let bytes = chunk.pack(&text).unwrap();
    assert_eq!(chunk.unpack_read(&mut Cursor::new(bytes)).unwrap(), text);
}

#[test]
fn test_array_of_nested_records() {
    let header = chunk_header();
    let table = Schema::builder("Table")
        .options(SchemaOptions::little_endian())
        .field(
            "entries",
            Arc::new(ArrayCodec::new(Header::prefixed(UIntWidth::U16), header.codec()).unwrap()),
        )
        .build()
        .unwrap();
    let entry = |sig: &[u8], size: u32| {
        Value::Record(Record::new().with("sig", sig).with("size", size))
    };
    let record = Record::new().with(
        "entries",
        Value::List(vec![entry(b"aaaa", 1), entry(b"bbbb", 2)]),
    );
    let bytes = table.pack(&record).unwrap();
    assert_eq!(bytes.len(), 2 + 2 * 8);
    assert_eq!(table.unpack(&bytes).unwrap(), record);
}

#[test]
fn test_recursive_tree() {
    let slot = SchemaSlot::new();
    let children = ArrayCodec::new(Header::prefixed(UIntWidth::U8), slot.codec()).unwrap();
    let node = Arc::new(
        Schema::builder("Node")
            .options(SchemaOptions::network())
            .field("id", PrimitiveKind::U16.codec())
            .field("children", Arc::new(children))
            .build()
            .unwrap(),
    );
    slot.bind(&node).unwrap();

    let leaf = |id: u16| Value::Record(Record::new().with("id", id).with("children", Vec::<Value>::new()));
    let root = Record::new().with("id", 1u16).with(
        "children",
        vec![
            leaf(2),
            Value::Record(Record::new().with("id", 3u16).with("children", vec![leaf(4)])),
        ],
    );

    let bytes = node.pack(&root).unwrap();
    assert_eq!(bytes, vec![0, 1, 2, 0, 2, 0, 0, 3, 1, 0, 4, 0]);
    assert_eq!(node.unpack(&bytes).unwrap(), root);
    assert_eq!(node.unpack_read(&mut Cursor::new(bytes)).unwrap(), root);
}

#[test]
fn test_unbound_slot_fails_at_use() {
    let slot = SchemaSlot::new();
    let schema = Schema::builder("Dangling")
        .field("next", slot.codec())
        .build()
        .unwrap();
    let err = schema.unpack(&[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}

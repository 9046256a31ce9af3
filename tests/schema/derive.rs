//! Derived schemas and options

use std::sync::Arc;
use structpack::prelude::*;

fn base() -> Schema {
    Schema::builder("Base")
        .options(SchemaOptions::little_endian())
        .field("magic", PrimitiveKind::Bytes(2).codec())
        .pad(2)
        .field("length", PrimitiveKind::U32.codec())
        .build()
        .unwrap()
}

#[test]
fn test_extend_keeps_base_untouched() {
    let base = base();
    let derived = base
        .extend(
            "WithName",
            SchemaOptions::little_endian(),
            [SchemaPatch::append(FieldDescriptor::named(
                "name",
                Arc::new(PrefixedBytesCodec::new(UIntWidth::U8)),
            ))],
        )
        .unwrap();
    assert_eq!(base.value_count(), 2);
    assert_eq!(derived.value_count(), 3);

    let record = Record::new()
        .with("magic", &b"MZ"[..])
        .with("length", 1u32)
        .with("name", &b"x"[..]);
    assert_eq!(
        derived.pack(&record).unwrap(),
        vec![b'M', b'Z', 0, 0, 1, 0, 0, 0, 1, b'x']
    );
}

#[test]
fn test_replace_padding_with_named_field() {
    let derived = base()
        .extend(
            "Flagged",
            SchemaOptions::little_endian(),
            [SchemaPatch::replace(FieldDescriptor::named(
                "_pad1",
                PrimitiveKind::U16.codec(),
            ))],
        )
        .unwrap();
    assert_eq!(
        derived.names().iter().map(|n| n.to_string()).collect::<Vec<_>>(),
        vec!["magic", "_pad1", "length"]
    );
}

#[test]
fn test_duplicate_after_patch_rejected() {
    let err = base()
        .extend(
            "Dup",
            SchemaOptions::little_endian(),
            [SchemaPatch::append(FieldDescriptor::named(
                "length",
                PrimitiveKind::U8.codec(),
            ))],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}

#[test]
fn test_policy_from_json_options() {
    let strict: SchemaOptions = serde_json::from_str(r#"{"byte_order": "big_endian"}"#).unwrap();
    assert!(base().extend("Strict", strict, Vec::new()).is_err());

    let overriding: SchemaOptions =
        serde_json::from_str(r#"{"byte_order": "big_endian", "byte_order_policy": "override"}"#)
            .unwrap();
    let derived = base().extend("Override", overriding, Vec::new()).unwrap();
    let record = Record::new().with("magic", &b"MZ"[..]).with("length", 1u32);
    assert_eq!(
        derived.pack(&record).unwrap(),
        vec![b'M', b'Z', 0, 0, 0, 0, 0, 1]
    );
}

#[test]
fn test_final_field_cannot_be_followed_after_patch() {
    let tail = base()
        .extend(
            "Tail",
            SchemaOptions::little_endian(),
            [SchemaPatch::append(FieldDescriptor::named(
                "rest",
                Arc::new(RemainingCodec::new()),
            ))],
        )
        .unwrap();
    let err = tail
        .extend(
            "TooLong",
            SchemaOptions::little_endian(),
            [SchemaPatch::append(FieldDescriptor::named(
                "after",
                PrimitiveKind::U8.codec(),
            ))],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}

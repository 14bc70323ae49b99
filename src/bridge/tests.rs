use super::*;
use crate::config::CodecConfig;
use crate::error::FlatRowError;
use crate::memory::{SystemPool, TrackingPool};
use crate::types::RowKind;
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Decimal128Array, DictionaryArray, Float64Array,
    Int32Array, Int64Array, ListArray, StringArray,
};
use arrow::datatypes::{DataType, Field, Int32Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Helper: a small batch mixing inline and variable-width columns.
fn create_mixed_test_batch() -> (RecordBatch, SchemaRef) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("flag", DataType::Boolean, true),
        Field::new("name", DataType::Utf8, true),
        Field::new(
            "scores",
            DataType::List(Arc::new(Field::new("item", DataType::Int32, true))),
            true,
        ),
        Field::new("price", DataType::Decimal128(10, 2), true),
    ]));

    let scores = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
        Some(vec![Some(1), None, Some(3)]),
        None,
        Some(vec![]),
        Some(vec![Some(-7)]),
    ]);
    let prices = Decimal128Array::from(vec![Some(12345), None, Some(-1), Some(0)])
        .with_precision_and_scale(10, 2)
        .unwrap();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
            Arc::new(BooleanArray::from(vec![Some(true), None, Some(false), Some(true)])),
            Arc::new(StringArray::from(vec![Some("ab"), Some(""), None, Some("hello world")])),
            Arc::new(scores),
            Arc::new(prices),
        ],
    )
    .unwrap();
    (batch, schema)
}

fn create_fixed_width_test_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int32, true),
        Field::new("b", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(vec![Some(1), None, Some(3)])),
        Arc::new(Float64Array::from(vec![Some(0.5), Some(-1.5), None])),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

#[test]
fn test_encode_decode_roundtrip() {
    // 1. Arrange
    let (batch, schema) = create_mixed_test_batch();

    // 2. Act
    let encoded = encode_batch(&batch).unwrap();
    let decoded = decode_batch(&encoded, schema, &SystemPool).unwrap();

    // 3. Assert
    assert_eq!(encoded.num_rows(), 4);
    assert_eq!(decoded, batch);
}

#[test]
fn test_encoded_rows_are_addressable() {
    let (batch, _) = create_mixed_test_batch();
    let encoded = encode_batch(&batch).unwrap();

    let rows = encoded.rows().unwrap();
    assert_eq!(rows.len(), 4);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(encoded.row(i), Some(*row));
    }
    assert_eq!(encoded.row(4), None);
    assert_eq!(encoded.row_offsets[0], 0);
}

#[test]
fn test_verified_and_unverified_encodings_match() {
    let (batch, _) = create_mixed_test_batch();
    let verified = encode_batch(&batch).unwrap();

    let config = CodecConfig {
        verify_row_sizes: false,
        ..CodecConfig::default()
    };
    let unverified = encode_batch_with_config(&batch, &config).unwrap();
    assert_eq!(verified, unverified);
}

#[test]
fn test_row_limit_is_enforced() {
    let (batch, _) = create_mixed_test_batch();
    let config = CodecConfig {
        max_row_bytes: 16,
        ..CodecConfig::default()
    };
    let result = encode_batch_with_config(&batch, &config);
    assert!(matches!(
        result,
        Err(FlatRowError::RowTooLarge { limit: 16, .. })
    ));
}

#[test]
fn test_analyze_batch_reports_sizes() {
    // 1. Arrange
    let (batch, _) = create_mixed_test_batch();

    // 2. Act
    let stats = analyze_batch(&batch).unwrap();
    let encoded = encode_batch(&batch).unwrap();

    // 3. Assert
    assert_eq!(stats.num_rows, 4);
    assert_eq!(stats.fixed_size, 8 + 5 * 8);
    assert_eq!(stats.fixed_row_size, None);
    assert_eq!(stats.framed_bytes, encoded.buffer.len());
    assert_eq!(stats.total_row_bytes + 4 * 4, stats.framed_bytes);
    assert!(stats.min_row_size >= stats.fixed_size);
    assert!(stats.max_row_size > stats.min_row_size);
    assert!(stats.variable_ratio() > 0.0);
    assert_eq!(
        stats.field_kinds[..3],
        [RowKind::BigInt, RowKind::Boolean, RowKind::Varchar]
    );
}

#[test]
fn test_analyze_fixed_width_batch() {
    let batch = create_fixed_width_test_batch();
    let stats = analyze_batch(&batch).unwrap();
    assert_eq!(stats.fixed_row_size, Some(24));
    assert_eq!(stats.min_row_size, 24);
    assert_eq!(stats.max_row_size, 24);
    assert_eq!(stats.variable_ratio(), 0.0);

    let json = serde_json::to_string(&stats).unwrap();
    assert!(json.contains("\"Integer\""));
}

#[test]
fn test_decode_allocates_through_pool() {
    let batch = create_fixed_width_test_batch();
    let encoded = encode_batch(&batch).unwrap();

    let pool = TrackingPool::new();
    let decoded = decode_batch(&encoded, batch.schema(), &pool).unwrap();
    assert_eq!(decoded, batch);
    assert!(pool.allocation_count() >= 2);
    assert!(pool.requested_bytes() >= 3 * 4 + 3 * 8);
}

#[test]
fn test_empty_batch_roundtrip() {
    let (batch, schema) = create_mixed_test_batch();
    let empty = batch.slice(0, 0);

    let encoded = encode_batch(&empty).unwrap();
    assert!(encoded.buffer.is_empty());
    let decoded = decode_batch(&encoded, schema, &SystemPool).unwrap();
    assert_eq!(decoded.num_rows(), 0);
    assert_eq!(decoded.column(2).len(), 0);
}

#[test]
fn test_decode_rejects_truncated_buffer() {
    let (batch, schema) = create_mixed_test_batch();
    let mut encoded = encode_batch(&batch).unwrap();
    encoded.buffer.truncate(encoded.buffer.len() - 1);

    let result = decode_batch(&encoded, schema, &SystemPool);
    assert!(matches!(result, Err(FlatRowError::MalformedRow(_))));
}

#[test]
fn test_dictionary_batch_roundtrip_with_its_own_schema() {
    // 1. Arrange
    let tags: DictionaryArray<Int32Type> =
        vec![Some("red"), None, Some("blue"), Some("red")].into_iter().collect();
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("tag", tags.data_type().clone(), true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Int64Array::from(vec![1, 2, 3, 4])), Arc::new(tags)],
    )
    .unwrap();

    // 2. Act
    let encoded = encode_batch(&batch).unwrap();
    let decoded = decode_batch(&encoded, schema, &SystemPool).unwrap();

    // 3. Assert
    assert_eq!(decoded.schema().field(1).data_type(), &DataType::Utf8);
    assert_eq!(decoded.column(0), batch.column(0));
    let expected = StringArray::from(vec![Some("red"), None, Some("blue"), Some("red")]);
    assert_eq!(decoded.column(1).as_string::<i32>(), &expected);
}

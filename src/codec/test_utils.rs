//! Shared helpers for codec tests: a seeded random batch generator and a few
//! schema builders.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Decimal128Array, ListArray, MapArray, NullArray,
    PrimitiveArray, StringArray, StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Date32Type, Field, Fields, Float32Type, Float64Type, Int16Type,
    Int32Type, Int64Type, Int8Type, Schema, SchemaRef, TimeUnit, TimestampMicrosecondType,
};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::codec::RowSerializer;

//==================================================================================
// 1. Type Builders
//==================================================================================

pub(crate) fn list_of(element: DataType) -> DataType {
    DataType::List(Arc::new(Field::new("item", element, true)))
}

pub(crate) fn map_of(key: DataType, value: DataType) -> DataType {
    let entries = Field::new(
        "entries",
        DataType::Struct(Fields::from(vec![
            Field::new("keys", key, false),
            Field::new("values", value, true),
        ])),
        false,
    );
    DataType::Map(Arc::new(entries), false)
}

pub(crate) fn row_of(types: Vec<DataType>) -> DataType {
    DataType::Struct(
        types
            .into_iter()
            .enumerate()
            .map(|(i, dt)| Field::new(format!("f{}", i), dt, true))
            .collect(),
    )
}

pub(crate) fn schema_of(types: Vec<DataType>) -> SchemaRef {
    let fields: Vec<Field> = types
        .into_iter()
        .enumerate()
        .map(|(i, dt)| Field::new(format!("c{}", i), dt, true))
        .collect();
    Arc::new(Schema::new(fields))
}

fn timestamp() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, None)
}

/// A wide row type exercising every supported kind, alone and nested.
pub(crate) fn wide_row_schema() -> SchemaRef {
    use DataType::*;
    schema_of(vec![
        Boolean,
        Int8,
        Int16,
        Int32,
        Utf8,
        Int64,
        Float32,
        Float64,
        Utf8,
        Binary,
        Null,
        Decimal128(20, 2),
        Decimal128(12, 4),
        // Arrays.
        list_of(Boolean),
        list_of(Int8),
        list_of(Int16),
        list_of(Int32),
        list_of(Int64),
        list_of(Float32),
        list_of(Float64),
        list_of(Utf8),
        list_of(Binary),
        list_of(Null),
        list_of(Decimal128(20, 2)),
        list_of(Decimal128(12, 4)),
        // Nested arrays.
        list_of(list_of(Int32)),
        list_of(list_of(Int64)),
        list_of(list_of(Utf8)),
        list_of(list_of(Null)),
        // Maps.
        map_of(Int64, Float32),
        map_of(Int64, Int64),
        map_of(Int64, Utf8),
        map_of(Int64, Decimal128(20, 2)),
        map_of(Int64, Decimal128(12, 4)),
        map_of(Int32, map_of(Int64, Float64)),
        map_of(Utf8, Boolean),
        map_of(Int32, map_of(Int64, list_of(Float32))),
        // Timestamps and dates.
        timestamp(),
        Date32,
        list_of(timestamp()),
        list_of(Date32),
        map_of(Date32, list_of(timestamp())),
        // Rows.
        row_of(vec![
            Boolean,
            Int32,
            timestamp(),
            Decimal128(20, 2),
            Utf8,
            list_of(Int64),
        ]),
        row_of(vec![
            Boolean,
            row_of(vec![Int32, timestamp()]),
            Utf8,
            list_of(Int64),
        ]),
        list_of(row_of(vec![Int64, Utf8])),
        map_of(Int64, row_of(vec![Boolean, Int8, Float32])),
    ])
}

//==================================================================================
// 2. Random Batch Generator
//==================================================================================

const ALPHABET: &[char] = &['a', 'b', 'q', 'Z', '0', '9', ' ', '-', 'é', 'ß', '中'];

/// Generates arbitrary Arrow data for a given type tree from a fixed seed.
pub(crate) struct ArrayFuzzer {
    rng: StdRng,
    null_ratio: f64,
    max_string_len: usize,
    max_container_len: usize,
}

impl ArrayFuzzer {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            null_ratio: 0.1,
            max_string_len: 20,
            max_container_len: 10,
        }
    }

    pub(crate) fn fuzz_batch(&mut self, schema: &SchemaRef, num_rows: usize) -> RecordBatch {
        let columns = schema
            .fields()
            .iter()
            .map(|f| self.fuzz_array(f.data_type(), num_rows, f.is_nullable()))
            .collect();
        RecordBatch::try_new(schema.clone(), columns).unwrap()
    }

    fn validity(&mut self, len: usize, nullable: bool) -> Vec<bool> {
        (0..len)
            .map(|_| !nullable || !self.rng.random_bool(self.null_ratio))
            .collect()
    }

    fn nulls(validity: &[bool]) -> Option<NullBuffer> {
        if validity.iter().all(|&v| v) {
            None
        } else {
            Some(NullBuffer::from(validity.to_vec()))
        }
    }

    fn random_bytes(&mut self) -> Vec<u8> {
        let len = self.rng.random_range(0..=self.max_string_len);
        (0..len).map(|_| self.rng.random()).collect()
    }

    fn random_string(&mut self) -> String {
        let len = self.rng.random_range(0..=self.max_string_len);
        (0..len)
            .map(|_| ALPHABET[self.rng.random_range(0..ALPHABET.len())])
            .collect()
    }

    fn fuzz_primitive<T: ArrowPrimitiveType>(
        &mut self,
        len: usize,
        nullable: bool,
        mut generate: impl FnMut(&mut StdRng) -> T::Native,
    ) -> ArrayRef {
        let validity = self.validity(len, nullable);
        let values: Vec<T::Native> = (0..len).map(|_| generate(&mut self.rng)).collect();
        Arc::new(PrimitiveArray::<T>::new(
            ScalarBuffer::from(values),
            Self::nulls(&validity),
        ))
    }

    /// Random container lengths; null containers are empty.
    fn fuzz_offsets(&mut self, validity: &[bool]) -> OffsetBuffer<i32> {
        let lengths: Vec<usize> = validity
            .iter()
            .map(|&valid| {
                if valid {
                    self.rng.random_range(0..=self.max_container_len)
                } else {
                    0
                }
            })
            .collect();
        OffsetBuffer::from_lengths(lengths)
    }

    pub(crate) fn fuzz_array(&mut self, data_type: &DataType, len: usize, nullable: bool) -> ArrayRef {
        match data_type {
            DataType::Null => Arc::new(NullArray::new(len)),
            DataType::Boolean => {
                let validity = self.validity(len, nullable);
                let values: Vec<Option<bool>> = validity
                    .iter()
                    .map(|&valid| valid.then(|| self.rng.random_bool(0.5)))
                    .collect();
                Arc::new(BooleanArray::from(values))
            }
            DataType::Int8 => self.fuzz_primitive::<Int8Type>(len, nullable, |r| r.random()),
            DataType::Int16 => self.fuzz_primitive::<Int16Type>(len, nullable, |r| r.random()),
            DataType::Int32 => self.fuzz_primitive::<Int32Type>(len, nullable, |r| r.random()),
            DataType::Int64 => self.fuzz_primitive::<Int64Type>(len, nullable, |r| r.random()),
            DataType::Float32 => {
                self.fuzz_primitive::<Float32Type>(len, nullable, |r| r.random_range(-1e6..1e6))
            }
            DataType::Float64 => {
                self.fuzz_primitive::<Float64Type>(len, nullable, |r| r.random_range(-1e12..1e12))
            }
            DataType::Date32 => self.fuzz_primitive::<Date32Type>(len, nullable, |r| {
                r.random_range(-100_000..100_000)
            }),
            DataType::Timestamp(TimeUnit::Microsecond, _) => self
                .fuzz_primitive::<TimestampMicrosecondType>(len, nullable, |r| r.random()),
            DataType::Decimal128(precision, scale) => {
                let max = 10i128.pow(*precision as u32) - 1;
                let validity = self.validity(len, nullable);
                let values: Vec<Option<i128>> = validity
                    .iter()
                    .map(|&valid| valid.then(|| self.rng.random_range(-max..=max)))
                    .collect();
                Arc::new(
                    Decimal128Array::from(values)
                        .with_precision_and_scale(*precision, *scale)
                        .unwrap(),
                )
            }
            DataType::Utf8 => {
                let validity = self.validity(len, nullable);
                let values: Vec<Option<String>> = validity
                    .iter()
                    .map(|&valid| valid.then(|| self.random_string()))
                    .collect();
                Arc::new(StringArray::from(values))
            }
            DataType::Binary => {
                let validity = self.validity(len, nullable);
                let values: Vec<Option<Vec<u8>>> = validity
                    .iter()
                    .map(|&valid| valid.then(|| self.random_bytes()))
                    .collect();
                Arc::new(BinaryArray::from_iter(values))
            }
            DataType::List(element) => {
                let validity = self.validity(len, nullable);
                let offsets = self.fuzz_offsets(&validity);
                let child_len = *offsets.last().unwrap() as usize;
                let child = self.fuzz_array(element.data_type(), child_len, element.is_nullable());
                Arc::new(
                    ListArray::try_new(element.clone(), offsets, child, Self::nulls(&validity))
                        .unwrap(),
                )
            }
            DataType::Map(entries_field, ordered) => {
                let DataType::Struct(kv) = entries_field.data_type() else {
                    unreachable!("map entries are always a struct")
                };
                let validity = self.validity(len, nullable);
                let offsets = self.fuzz_offsets(&validity);
                let entry_count = *offsets.last().unwrap() as usize;
                let keys = self.fuzz_array(kv[0].data_type(), entry_count, false);
                let values =
                    self.fuzz_array(kv[1].data_type(), entry_count, kv[1].is_nullable());
                let entries = StructArray::try_new(kv.clone(), vec![keys, values], None).unwrap();
                Arc::new(
                    MapArray::try_new(
                        entries_field.clone(),
                        offsets,
                        entries,
                        Self::nulls(&validity),
                        *ordered,
                    )
                    .unwrap(),
                )
            }
            DataType::Struct(fields) => {
                let validity = self.validity(len, nullable);
                let children = fields
                    .iter()
                    .map(|f| self.fuzz_array(f.data_type(), len, f.is_nullable()))
                    .collect();
                Arc::new(
                    StructArray::try_new(fields.clone(), children, Self::nulls(&validity))
                        .unwrap(),
                )
            }
            other => panic!("no generator for {:?}", other),
        }
    }
}

//==================================================================================
// 3. Encoding Helpers
//==================================================================================

/// Serializes every row of `batch` into its own exactly-sized buffer.
pub(crate) fn encode_each_row(batch: &RecordBatch) -> Vec<Vec<u8>> {
    let serializer = RowSerializer::new(batch).unwrap();
    (0..batch.num_rows())
        .map(|row| serializer.serialize_to_vec(row).unwrap())
        .collect()
}

pub(crate) fn as_slices(rows: &[Vec<u8>]) -> Vec<&[u8]> {
    rows.iter().map(Vec::as_slice).collect()
}

//! The deserializer: rebuilds an Arrow `RecordBatch` from encoded rows.
//!
//! Decoding runs in two passes per level. The first pass walks the bitmaps and
//! slots of every row and gathers, per column, the byte range that holds each
//! value (the slot itself for inline kinds, the referenced content otherwise;
//! `None` for nulls). The second pass turns each gathered column into an Arrow
//! array, recursing into arrays, maps and nested rows with the ranges gathered
//! from their blobs. Every value, offset, data and validity buffer is obtained
//! from the caller's `MemoryPool`.
//!
//! All offsets and counts read from the input are bounds-checked; a row that
//! points outside itself is reported as `MalformedRow`.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, ListArray, MapArray, NullArray, PrimitiveArray,
    StringArray, StructArray,
};
use arrow::buffer::{BooleanBuffer, Buffer, MutableBuffer, NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{
    ArrowPrimitiveType, Date32Type, Decimal128Type, Float32Type, Float64Type, Int16Type,
    Int32Type, Int64Type, Int8Type, TimestampMicrosecondType,
};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::bit_util;
use arrow_schema::DataType;

use crate::codec::framing::framed_rows;
use crate::codec::slot::{read_reference, SlotValue};
use crate::config::{ARRAY_COUNT_WIDTH, LONG_DECIMAL_WIDTH, MAP_HEADER_WIDTH, SLOT_WIDTH};
use crate::error::{FlatRowError, Result};
use crate::layout::{array_fixed_size, fixed_region_size, LayoutNode, RowLayout};
use crate::memory::MemoryPool;
use crate::null_handling::{bitmap_bytes, is_null, validity_to_null_buffer};
use crate::types::{DecimalWidth, RowKind};

/// The encoded bytes of one value per output row; `None` marks a null.
type Gathered<'a> = Vec<Option<&'a [u8]>>;

//==================================================================================
// 1. Public Entry Points
//==================================================================================

/// Decodes individually addressed rows into a batch with one output row per
/// input row, in order.
pub fn deserialize(
    rows: &[&[u8]],
    layout: &RowLayout,
    pool: &dyn MemoryPool,
) -> Result<RecordBatch> {
    let mut columns: Vec<Gathered> = vec![Vec::with_capacity(rows.len()); layout.field_count()];
    for (index, row) in rows.iter().enumerate() {
        if row.len() < layout.fixed_size() {
            return Err(FlatRowError::malformed(format!(
                "Row {} holds {} bytes, less than its fixed region of {}",
                index,
                row.len(),
                layout.fixed_size()
            )));
        }
        gather_row(row, layout.fields(), &mut columns)?;
    }

    let arrays = layout
        .fields()
        .iter()
        .zip(&columns)
        .map(|(node, values)| decode_column(node, values, pool))
        .collect::<Result<Vec<_>>>()?;

    log_metric!("event"="deserialize", "rows"=rows.len(), "columns"=arrays.len());
    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        layout.schema().clone(),
        arrays,
        &options,
    )?)
}

/// Decodes every framed row of every buffer, in buffer order.
pub fn deserialize_framed(
    buffers: &[&[u8]],
    layout: &RowLayout,
    pool: &dyn MemoryPool,
) -> Result<RecordBatch> {
    let rows = buffers
        .iter()
        .flat_map(|buffer| framed_rows(buffer))
        .collect::<Result<Vec<_>>>()?;
    deserialize(&rows, layout, pool)
}

//==================================================================================
// 2. Gathering Pass
//==================================================================================

/// Reads position `position` of a bitmap + slots region inside `frame`.
///
/// The caller has already checked that the whole fixed region lies in `frame`.
fn read_value<'a>(
    frame: &'a [u8],
    bitmap_at: usize,
    slots_at: usize,
    position: usize,
    node: &LayoutNode,
) -> Result<Option<&'a [u8]>> {
    if is_null(&frame[bitmap_at..], position) {
        return Ok(None);
    }
    let slot_at = slots_at + position * SLOT_WIDTH;
    let slot = &frame[slot_at..slot_at + SLOT_WIDTH];
    if node.is_fixed_width() {
        return Ok(Some(slot));
    }
    let (offset, len) = read_reference(slot);
    offset
        .checked_add(len)
        .and_then(|end| frame.get(offset..end))
        .map(Some)
        .ok_or_else(|| {
            FlatRowError::malformed(format!(
                "{} value at offset {} with length {} overruns its {}-byte frame",
                node.kind,
                offset,
                len,
                frame.len()
            ))
        })
}

/// Appends one value per field of the row blob `blob` to `columns`.
fn gather_row<'a>(
    blob: &'a [u8],
    fields: &[LayoutNode],
    columns: &mut [Gathered<'a>],
) -> Result<()> {
    if blob.len() < fixed_region_size(fields.len()) {
        return Err(FlatRowError::malformed(format!(
            "Nested row of {} fields holds only {} bytes",
            fields.len(),
            blob.len()
        )));
    }
    let slots_at = bitmap_bytes(fields.len());
    for (position, (node, column)) in fields.iter().zip(columns.iter_mut()).enumerate() {
        column.push(read_value(blob, 0, slots_at, position, node)?);
    }
    Ok(())
}

/// Appends every element of the array blob `blob` to `out` and returns the
/// element count.
fn gather_array<'a>(
    blob: &'a [u8],
    element: &LayoutNode,
    out: &mut Gathered<'a>,
) -> Result<usize> {
    let count = blob
        .get(..ARRAY_COUNT_WIDTH)
        .map(i32::read_slot)
        .ok_or_else(|| FlatRowError::malformed("Array blob is shorter than its element count"))?;
    let count = usize::try_from(count)
        .map_err(|_| FlatRowError::malformed(format!("Negative array element count {}", count)))?;
    if blob.len() < array_fixed_size(count) {
        return Err(FlatRowError::malformed(format!(
            "Array of {} elements holds only {} bytes",
            count,
            blob.len()
        )));
    }

    let slots_at = ARRAY_COUNT_WIDTH + bitmap_bytes(count);
    out.reserve(count);
    for position in 0..count {
        out.push(read_value(blob, ARRAY_COUNT_WIDTH, slots_at, position, element)?);
    }
    Ok(count)
}

/// Splits a map blob into its keys and values array blobs.
fn split_map(blob: &[u8]) -> Result<(&[u8], &[u8])> {
    let keys_len = blob
        .get(..MAP_HEADER_WIDTH)
        .map(u64::read_slot)
        .ok_or_else(|| FlatRowError::malformed("Map blob is shorter than its header"))?;
    let keys_end = usize::try_from(keys_len)
        .ok()
        .and_then(|len| len.checked_add(MAP_HEADER_WIDTH))
        .filter(|&end| end <= blob.len())
        .ok_or_else(|| {
            FlatRowError::malformed(format!(
                "Map keys length {} overruns its {}-byte blob",
                keys_len,
                blob.len()
            ))
        })?;
    Ok((&blob[MAP_HEADER_WIDTH..keys_end], &blob[keys_end..]))
}

//==================================================================================
// 3. Column Construction
//==================================================================================

fn decode_column(
    node: &LayoutNode,
    values: &[Option<&[u8]>],
    pool: &dyn MemoryPool,
) -> Result<ArrayRef> {
    let array: ArrayRef = match node.kind {
        RowKind::Boolean => decode_boolean(values, pool),
        RowKind::TinyInt => decode_primitive::<Int8Type, _>(node, values, pool, inline::<i8>)?,
        RowKind::SmallInt => decode_primitive::<Int16Type, _>(node, values, pool, inline::<i16>)?,
        RowKind::Integer => decode_primitive::<Int32Type, _>(node, values, pool, inline::<i32>)?,
        RowKind::BigInt => decode_primitive::<Int64Type, _>(node, values, pool, inline::<i64>)?,
        RowKind::Real => decode_primitive::<Float32Type, _>(node, values, pool, inline::<f32>)?,
        RowKind::Double => decode_primitive::<Float64Type, _>(node, values, pool, inline::<f64>)?,
        RowKind::Decimal {
            width: DecimalWidth::Short,
            ..
        } => decode_primitive::<Decimal128Type, _>(node, values, pool, |slot| {
            Ok(i64::read_slot(slot) as i128)
        })?,
        RowKind::Decimal {
            width: DecimalWidth::Long,
            ..
        } => decode_primitive::<Decimal128Type, _>(node, values, pool, read_long_decimal)?,
        RowKind::Timestamp => {
            decode_primitive::<TimestampMicrosecondType, _>(node, values, pool, inline::<i64>)?
        }
        RowKind::Date => decode_primitive::<Date32Type, _>(node, values, pool, inline::<i32>)?,
        RowKind::Unknown => Arc::new(NullArray::new(values.len())),
        RowKind::Varchar => {
            let (offsets, data, nulls) = decode_bytes(values, pool)?;
            let strings = StringArray::try_new(offsets, data, nulls)
                .map_err(|e| FlatRowError::malformed(format!("Invalid VARCHAR content: {}", e)))?;
            Arc::new(strings)
        }
        RowKind::Varbinary => {
            let (offsets, data, nulls) = decode_bytes(values, pool)?;
            Arc::new(BinaryArray::try_new(offsets, data, nulls)?)
        }
        RowKind::Array => decode_array(node, values, pool)?,
        RowKind::Map => decode_map(node, values, pool)?,
        RowKind::Row => decode_row(node, values, pool)?,
    };
    Ok(array)
}

/// Builds the validity buffer for `values` from pool memory.
fn decode_nulls(values: &[Option<&[u8]>], pool: &dyn MemoryPool) -> Option<NullBuffer> {
    let mut bits = zeroed_bits(values.len(), pool);
    for (i, value) in values.iter().enumerate() {
        if value.is_some() {
            bit_util::set_bit(bits.as_slice_mut(), i);
        }
    }
    validity_to_null_buffer(BooleanBuffer::new(bits.into(), 0, values.len()))
}

fn zeroed_bits(len: usize, pool: &dyn MemoryPool) -> MutableBuffer {
    let bytes = bit_util::ceil(len, 8);
    let mut bits = pool.allocate(bytes);
    bits.resize(bytes, 0);
    bits
}

fn decode_boolean(values: &[Option<&[u8]>], pool: &dyn MemoryPool) -> ArrayRef {
    let mut bits = zeroed_bits(values.len(), pool);
    for (i, value) in values.iter().enumerate() {
        if matches!(value, Some(slot) if slot[0] != 0) {
            bit_util::set_bit(bits.as_slice_mut(), i);
        }
    }
    let values_buffer = BooleanBuffer::new(bits.into(), 0, values.len());
    Arc::new(BooleanArray::new(values_buffer, decode_nulls(values, pool)))
}

fn decode_primitive<T, F>(
    node: &LayoutNode,
    values: &[Option<&[u8]>],
    pool: &dyn MemoryPool,
    read: F,
) -> Result<ArrayRef>
where
    T: ArrowPrimitiveType,
    F: Fn(&[u8]) -> Result<T::Native>,
{
    let mut buffer = pool.allocate(values.len() * std::mem::size_of::<T::Native>());
    for value in values {
        let native = match value {
            Some(bytes) => read(bytes)?,
            None => T::Native::default(),
        };
        buffer.push(native);
    }
    let scalars = ScalarBuffer::<T::Native>::new(buffer.into(), 0, values.len());
    let array = PrimitiveArray::<T>::new(scalars, decode_nulls(values, pool))
        .with_data_type(node.data_type.clone());
    Ok(Arc::new(array))
}

fn inline<N: SlotValue>(slot: &[u8]) -> Result<N> {
    Ok(N::read_slot(slot))
}

fn read_long_decimal(content: &[u8]) -> Result<i128> {
    if content.len() != LONG_DECIMAL_WIDTH {
        return Err(FlatRowError::malformed(format!(
            "Long decimal must occupy {} bytes, found {}",
            LONG_DECIMAL_WIDTH,
            content.len()
        )));
    }
    Ok(i128::read_slot(content))
}

/// Turns a running child count into an `i32` list offset.
fn list_offset(count: usize) -> Result<i32> {
    i32::try_from(count)
        .map_err(|_| FlatRowError::malformed(format!("Offset {} overflows an i32 list offset", count)))
}

fn decode_bytes(
    values: &[Option<&[u8]>],
    pool: &dyn MemoryPool,
) -> Result<(OffsetBuffer<i32>, Buffer, Option<NullBuffer>)> {
    let total: usize = values.iter().flatten().map(|bytes| bytes.len()).sum();
    list_offset(total)?;

    let mut offsets = pool.allocate((values.len() + 1) * std::mem::size_of::<i32>());
    let mut data = pool.allocate(total);
    offsets.push(0i32);
    for value in values {
        if let Some(bytes) = value {
            data.extend_from_slice(bytes);
        }
        offsets.push(data.len() as i32);
    }
    let offsets = OffsetBuffer::new(ScalarBuffer::new(offsets.into(), 0, values.len() + 1));
    Ok((offsets, data.into(), decode_nulls(values, pool)))
}

fn decode_array(
    node: &LayoutNode,
    values: &[Option<&[u8]>],
    pool: &dyn MemoryPool,
) -> Result<ArrayRef> {
    let DataType::List(element_field) = &node.data_type else {
        return Err(layout_mismatch(node));
    };
    let element = &node.children[0];

    let mut offsets = pool.allocate((values.len() + 1) * std::mem::size_of::<i32>());
    let mut children = Gathered::new();
    offsets.push(0i32);
    for blob in values {
        if let Some(blob) = blob {
            gather_array(blob, element, &mut children)?;
        }
        offsets.push(list_offset(children.len())?);
    }

    let child = decode_column(element, &children, pool)?;
    let offsets = OffsetBuffer::new(ScalarBuffer::new(offsets.into(), 0, values.len() + 1));
    Ok(Arc::new(ListArray::try_new(
        element_field.clone(),
        offsets,
        child,
        decode_nulls(values, pool),
    )?))
}

fn decode_map(
    node: &LayoutNode,
    values: &[Option<&[u8]>],
    pool: &dyn MemoryPool,
) -> Result<ArrayRef> {
    let DataType::Map(entries_field, ordered) = &node.data_type else {
        return Err(layout_mismatch(node));
    };
    let DataType::Struct(entry_fields) = entries_field.data_type() else {
        return Err(layout_mismatch(node));
    };
    let (key_node, value_node) = (&node.children[0], &node.children[1]);

    let mut offsets = pool.allocate((values.len() + 1) * std::mem::size_of::<i32>());
    let mut keys = Gathered::new();
    let mut items = Gathered::new();
    offsets.push(0i32);
    for blob in values {
        if let Some(blob) = blob {
            let (keys_blob, values_blob) = split_map(blob)?;
            let key_count = gather_array(keys_blob, key_node, &mut keys)?;
            let value_count = gather_array(values_blob, value_node, &mut items)?;
            if key_count != value_count {
                return Err(FlatRowError::malformed(format!(
                    "Map holds {} keys but {} values",
                    key_count, value_count
                )));
            }
        }
        offsets.push(list_offset(keys.len())?);
    }

    let entries = StructArray::try_new(
        entry_fields.clone(),
        vec![
            decode_column(key_node, &keys, pool)?,
            decode_column(value_node, &items, pool)?,
        ],
        None,
    )?;
    let offsets = OffsetBuffer::new(ScalarBuffer::new(offsets.into(), 0, values.len() + 1));
    Ok(Arc::new(MapArray::try_new(
        entries_field.clone(),
        offsets,
        entries,
        decode_nulls(values, pool),
        *ordered,
    )?))
}

fn decode_row(
    node: &LayoutNode,
    values: &[Option<&[u8]>],
    pool: &dyn MemoryPool,
) -> Result<ArrayRef> {
    let DataType::Struct(fields) = &node.data_type else {
        return Err(layout_mismatch(node));
    };
    let mut columns: Vec<Gathered> = vec![Vec::with_capacity(values.len()); node.children.len()];
    for blob in values {
        match blob {
            Some(blob) => gather_row(blob, &node.children, &mut columns)?,
            // Children of a null row are masked by the row's own validity.
            None => columns.iter_mut().for_each(|column| column.push(None)),
        }
    }

    let arrays = node
        .children
        .iter()
        .zip(&columns)
        .map(|(child, gathered)| decode_column(child, gathered, pool))
        .collect::<Result<Vec<_>>>()?;
    Ok(Arc::new(StructArray::try_new(
        fields.clone(),
        arrays,
        decode_nulls(values, pool),
    )?))
}

fn layout_mismatch(node: &LayoutNode) -> FlatRowError {
    FlatRowError::TypeMismatch(format!(
        "Layout node {} was planned from incompatible type {:?}",
        node.kind, node.data_type
    ))
}

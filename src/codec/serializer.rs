//! The serializer: writes one row at a time into a caller-owned buffer.
//!
//! Each row (and each nested row, array or map blob) is written in its own
//! coordinate frame: the fixed region first, then variable content appended
//! at a cursor that only moves forward. The cursor is threaded through the
//! recursion by value, so the serializer holds no mutable state and rows can
//! be written from several threads at once.

use std::ops::Range;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::codec::columns::ColumnReader;
use crate::codec::framing::write_frame_prefix;
use crate::codec::slot::{write_reference, SlotValue};
use crate::codec::vector::resolve_batch;
use crate::config::{
    ARRAY_COUNT_WIDTH, FRAME_PREFIX_WIDTH, LONG_DECIMAL_WIDTH, MAP_HEADER_WIDTH, SLOT_WIDTH,
};
use crate::error::{FlatRowError, Result};
use crate::layout::{array_fixed_size, fixed_region_size, RowLayout};
use crate::null_handling::{bitmap_bytes, set_null};

//==================================================================================
// 1. The Serializer
//==================================================================================

/// Encodes rows of a `RecordBatch` into the flat row format.
///
/// Construction resolves dictionary and run-end encoded columns and performs
/// all downcasts; after that every method takes `&self`.
#[derive(Debug, Clone)]
pub struct RowSerializer {
    layout: Arc<RowLayout>,
    columns: Vec<ColumnReader>,
    num_rows: usize,
}

impl RowSerializer {
    /// Plans a layout from the batch's own (resolved) schema.
    pub fn new(batch: &RecordBatch) -> Result<Self> {
        let resolved = resolve_batch(batch)?;
        let layout = Arc::new(RowLayout::try_new(resolved.schema())?);
        Self::build(&resolved, layout)
    }

    /// Reuses a layout planned earlier for the same row type.
    pub fn with_layout(batch: &RecordBatch, layout: Arc<RowLayout>) -> Result<Self> {
        let resolved = resolve_batch(batch)?;
        if resolved.num_columns() != layout.field_count() {
            return Err(FlatRowError::TypeMismatch(format!(
                "Layout has {} fields but the batch has {} columns",
                layout.field_count(),
                resolved.num_columns()
            )));
        }
        Self::build(&resolved, layout)
    }

    fn build(batch: &RecordBatch, layout: Arc<RowLayout>) -> Result<Self> {
        let columns = layout
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(node, column)| ColumnReader::try_new(node, column))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            layout,
            columns,
            num_rows: batch.num_rows(),
        })
    }

    pub fn layout(&self) -> &Arc<RowLayout> {
        &self.layout
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub(crate) fn columns(&self) -> &[ColumnReader] {
        &self.columns
    }

    pub(crate) fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.num_rows {
            return Err(FlatRowError::RowOutOfBounds {
                index: row,
                num_rows: self.num_rows,
            });
        }
        Ok(())
    }

    /// Writes `row` into the front of `dest` and returns the bytes written,
    /// which always equals `row_size(row)`. No framing prefix is written.
    pub fn serialize(&self, row: usize, dest: &mut [u8]) -> Result<usize> {
        let required = self.row_size(row)?;
        check_row_limit(required)?;
        if dest.len() < required {
            return Err(FlatRowError::BufferTooSmall {
                required,
                capacity: dest.len(),
            });
        }
        Ok(write_row(&self.columns, row, &mut dest[..required]))
    }

    /// Serializes `row` into a freshly allocated buffer of exactly its size.
    pub fn serialize_to_vec(&self, row: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.row_size(row)?];
        self.serialize(row, &mut buf)?;
        Ok(buf)
    }

    /// Writes `rows` back to back into `dest`, each preceded by its 4-byte
    /// little-endian length. Returns the offset of every frame within `dest`.
    pub fn serialize_framed(&self, rows: &[usize], dest: &mut [u8]) -> Result<Vec<usize>> {
        let sizes = self.row_sizes(rows)?;
        let required: usize = sizes.iter().map(|s| s + FRAME_PREFIX_WIDTH).sum();
        if dest.len() < required {
            return Err(FlatRowError::BufferTooSmall {
                required,
                capacity: dest.len(),
            });
        }

        let mut offsets = Vec::with_capacity(rows.len());
        let mut cursor = 0;
        for (&row, &size) in rows.iter().zip(&sizes) {
            check_row_limit(size)?;
            offsets.push(cursor);
            write_frame_prefix(&mut dest[cursor..], size);
            cursor += FRAME_PREFIX_WIDTH;
            let written = write_row(&self.columns, row, &mut dest[cursor..cursor + size]);
            debug_assert_eq!(written, size);
            cursor += written;
        }
        log_metric!("event"="serialize_framed", "rows"=rows.len(), "bytes"=cursor);
        Ok(offsets)
    }
}

fn check_row_limit(size: usize) -> Result<()> {
    if size > u32::MAX as usize {
        return Err(FlatRowError::RowTooLarge {
            size,
            limit: u32::MAX as usize,
        });
    }
    Ok(())
}

//==================================================================================
// 2. Recursive Writers
//==================================================================================

/// Writes one value's slot (and, if variable, its content at `cursor`) into
/// `frame`. Returns the advanced cursor.
fn write_field(
    column: &ColumnReader,
    index: usize,
    frame: &mut [u8],
    bitmap_at: usize,
    position: usize,
    slot_at: usize,
    cursor: usize,
) -> usize {
    if column.is_null(index) {
        set_null(&mut frame[bitmap_at..], position);
        return cursor;
    }
    if column.is_fixed_width() {
        column.write_inline(index, &mut frame[slot_at..slot_at + SLOT_WIDTH]);
        return cursor;
    }
    let written = write_variable(column, index, &mut frame[cursor..]);
    write_reference(&mut frame[slot_at..slot_at + SLOT_WIDTH], cursor, written);
    cursor + written
}

/// Writes a variable-width value at the front of `out` in its own frame.
fn write_variable(column: &ColumnReader, index: usize, out: &mut [u8]) -> usize {
    match column {
        ColumnReader::Varchar(a) => write_bytes(a.value(index).as_bytes(), out),
        ColumnReader::Varbinary(a) => write_bytes(a.value(index), out),
        ColumnReader::LongDecimal(a) => {
            a.value(index).write_slot(&mut out[..LONG_DECIMAL_WIDTH]);
            LONG_DECIMAL_WIDTH
        }
        ColumnReader::Array { element, .. } => {
            write_array(element, column.child_range(index), out)
        }
        ColumnReader::Map { keys, values, .. } => {
            let entries = column.child_range(index);
            let keys_len = write_array(keys, entries.clone(), &mut out[MAP_HEADER_WIDTH..]);
            // Header: byte length of the keys array blob, not of the whole map.
            (keys_len as u64).write_slot(&mut out[..MAP_HEADER_WIDTH]);
            let values_at = MAP_HEADER_WIDTH + keys_len;
            let values_len = write_array(values, entries, &mut out[values_at..]);
            values_at + values_len
        }
        ColumnReader::Row { fields, .. } => write_row(fields, index, out),
        _ => unreachable!("inline value written as variable content"),
    }
}

fn write_bytes(bytes: &[u8], out: &mut [u8]) -> usize {
    out[..bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

/// Writes a row blob: bitmap, one slot per field, then variable content.
pub(crate) fn write_row(fields: &[ColumnReader], index: usize, out: &mut [u8]) -> usize {
    let fixed = fixed_region_size(fields.len());
    let bitmap_len = bitmap_bytes(fields.len());
    out[..fixed].fill(0);

    let mut cursor = fixed;
    for (position, field) in fields.iter().enumerate() {
        let slot_at = bitmap_len + position * SLOT_WIDTH;
        cursor = write_field(field, index, out, 0, position, slot_at, cursor);
    }
    cursor
}

/// Writes an array blob: element count, bitmap, one slot per element, then
/// element variable content. References are relative to the blob start.
fn write_array(element: &ColumnReader, range: Range<usize>, out: &mut [u8]) -> usize {
    let count = range.len();
    let fixed = array_fixed_size(count);

    (count as i32).write_slot(&mut out[..ARRAY_COUNT_WIDTH]);
    out[ARRAY_COUNT_WIDTH..fixed].fill(0);

    let slots_at = ARRAY_COUNT_WIDTH + bitmap_bytes(count);
    let mut cursor = fixed;
    for (position, child) in range.enumerate() {
        let slot_at = slots_at + position * SLOT_WIDTH;
        cursor = write_field(
            element,
            child,
            out,
            ARRAY_COUNT_WIDTH,
            position,
            slot_at,
            cursor,
        );
    }
    cursor
}

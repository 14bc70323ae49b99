//! The size calculator.
//!
//! Computes the exact number of bytes the serializer will write for a row. The
//! recursion here mirrors `serializer.rs` case for case; the two must never
//! disagree, because callers allocate exactly what this module reports.
//!
//! Every row is sized independently of every other row, so callers may size
//! disjoint rows from several threads at once.

use std::ops::Range;

use crate::codec::columns::ColumnReader;
use crate::codec::serializer::RowSerializer;
use crate::config::{FRAME_PREFIX_WIDTH, LONG_DECIMAL_WIDTH, MAP_HEADER_WIDTH};
use crate::error::Result;
use crate::layout::{array_fixed_size, fixed_region_size};

//==================================================================================
// 1. Recursive Sizing
//==================================================================================

/// Bytes a non-null, variable-width value appends to the variable region.
pub(crate) fn variable_size(column: &ColumnReader, index: usize) -> usize {
    match column {
        ColumnReader::Varchar(a) => a.value_length(index) as usize,
        ColumnReader::Varbinary(a) => a.value_length(index) as usize,
        ColumnReader::LongDecimal(_) => LONG_DECIMAL_WIDTH,
        ColumnReader::Array { element, .. } => {
            array_blob_size(element, column.child_range(index))
        }
        ColumnReader::Map { keys, values, .. } => {
            let entries = column.child_range(index);
            MAP_HEADER_WIDTH
                + array_blob_size(keys, entries.clone())
                + array_blob_size(values, entries)
        }
        ColumnReader::Row { fields, .. } => row_blob_size(fields, index),
        _ => 0,
    }
}

/// Contribution of one field to its enclosing variable region.
#[inline]
fn field_variable_size(column: &ColumnReader, index: usize) -> usize {
    if column.is_null(index) || column.is_fixed_width() {
        0
    } else {
        variable_size(column, index)
    }
}

/// Size of a (nested or top-level) row blob.
pub(crate) fn row_blob_size(fields: &[ColumnReader], index: usize) -> usize {
    fixed_region_size(fields.len())
        + fields
            .iter()
            .map(|field| field_variable_size(field, index))
            .sum::<usize>()
}

/// Size of an array blob holding `element` values `range`.
pub(crate) fn array_blob_size(element: &ColumnReader, range: Range<usize>) -> usize {
    let fixed = array_fixed_size(range.len());
    if element.is_fixed_width() {
        return fixed;
    }
    fixed
        + range
            .map(|child| field_variable_size(element, child))
            .sum::<usize>()
}

//==================================================================================
// 2. Public Sizing API
//==================================================================================

impl RowSerializer {
    /// Exact encoded size of `row`, excluding any framing prefix.
    pub fn row_size(&self, row: usize) -> Result<usize> {
        self.check_row(row)?;
        Ok(self.row_size_unchecked(row))
    }

    pub(crate) fn row_size_unchecked(&self, row: usize) -> usize {
        match self.layout().fixed_row_size() {
            Some(size) => size,
            None => row_blob_size(self.columns(), row),
        }
    }

    /// Sizes of several rows. Each entry is computed independently.
    pub fn row_sizes(&self, rows: &[usize]) -> Result<Vec<usize>> {
        rows.iter().map(|&row| self.row_size(row)).collect()
    }

    /// Sizes of several rows including their 4-byte length prefix, i.e. the
    /// space each row takes in a framed, concatenated buffer.
    pub fn framed_row_sizes(&self, rows: &[usize]) -> Result<Vec<usize>> {
        rows.iter()
            .map(|&row| Ok(self.row_size(row)? + FRAME_PREFIX_WIDTH))
            .collect()
    }
}

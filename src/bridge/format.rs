// In: src/bridge/format.rs

//! Defines the batch-level containers returned by the bridge.
//!
//! The row bytes inside them are exactly the wire format produced by
//! `codec::serializer`; these structs only add bookkeeping around a framed
//! buffer so callers do not have to walk the prefixes themselves.

use serde::{Deserialize, Serialize};

use crate::codec::framing::framed_rows;
use crate::config::FRAME_PREFIX_WIDTH;
use crate::error::Result;
use crate::types::RowKind;

//==================================================================================
// I. Encoded Batch
//==================================================================================

/// A whole batch encoded as consecutive framed rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedRows {
    /// Framed rows back to back: `[len: u32 LE][row bytes]` per row.
    pub buffer: Vec<u8>,
    /// Offset of each row's length prefix within `buffer`.
    pub row_offsets: Vec<usize>,
}

impl EncodedRows {
    pub fn num_rows(&self) -> usize {
        self.row_offsets.len()
    }

    /// The unframed bytes of row `index`, or `None` if out of range.
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        let start = *self.row_offsets.get(index)? + FRAME_PREFIX_WIDTH;
        let end = self
            .row_offsets
            .get(index + 1)
            .copied()
            .unwrap_or(self.buffer.len());
        self.buffer.get(start..end)
    }

    /// Every row, unframed, validated against its prefix.
    pub fn rows(&self) -> Result<Vec<&[u8]>> {
        framed_rows(&self.buffer).collect()
    }
}

//==================================================================================
// II. Analysis Results
//==================================================================================

/// The public-facing struct for encoding analysis results, returned by `analyze_batch`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EncodingStats {
    pub num_rows: usize,
    /// Bitmap plus top-level slots; the floor for every row.
    pub fixed_size: usize,
    /// `Some` when every row has the same size.
    pub fixed_row_size: Option<usize>,
    /// Sum of all row sizes, excluding framing prefixes.
    pub total_row_bytes: usize,
    /// Size of the framed buffer `encode_batch` would produce.
    pub framed_bytes: usize,
    pub min_row_size: usize,
    pub max_row_size: usize,
    /// Top-level field kinds, in column order.
    pub field_kinds: Vec<RowKind>,
}

impl EncodingStats {
    /// Share of the encoded bytes taken by variable-width content.
    pub fn variable_ratio(&self) -> f64 {
        if self.total_row_bytes == 0 {
            return 0.0;
        }
        let fixed_total = self.fixed_size * self.num_rows;
        (self.total_row_bytes - fixed_total) as f64 / self.total_row_bytes as f64
    }
}

// In: src/bridge/stateless_api.rs

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;

use crate::bridge::format::{EncodedRows, EncodingStats};
use crate::codec::framing::write_frame_prefix;
use crate::codec::{deserialize_framed, resolve_schema, RowSerializer};
use crate::config::{CodecConfig, FRAME_PREFIX_WIDTH};
use crate::error::{FlatRowError, Result};
use crate::layout::RowLayout;
use crate::memory::MemoryPool;

/// Encodes every row of `batch` into one framed buffer using the default config.
pub fn encode_batch(batch: &RecordBatch) -> Result<EncodedRows> {
    encode_batch_with_config(batch, &CodecConfig::default())
}

/// Encodes every row of `batch` into one framed buffer.
pub fn encode_batch_with_config(
    batch: &RecordBatch,
    config: &CodecConfig,
) -> Result<EncodedRows> {
    // 1. Plan and size every row up front; the buffer is allocated exactly once.
    let serializer = RowSerializer::new(batch)?;
    let rows: Vec<usize> = (0..serializer.num_rows()).collect();
    let sizes = serializer.row_sizes(&rows)?;
    if let Some(&size) = sizes.iter().find(|&&size| size > config.max_row_bytes) {
        return Err(FlatRowError::RowTooLarge {
            size,
            limit: config.max_row_bytes,
        });
    }
    let total: usize = sizes.iter().map(|size| size + FRAME_PREFIX_WIDTH).sum();
    let mut buffer = vec![0u8; total];

    // 2. Write the rows, checking each against its computed size when asked to.
    let row_offsets = if config.verify_row_sizes {
        let mut offsets = Vec::with_capacity(rows.len());
        let mut cursor = 0;
        for (row, &computed) in sizes.iter().enumerate() {
            offsets.push(cursor);
            write_frame_prefix(&mut buffer[cursor..], computed);
            cursor += FRAME_PREFIX_WIDTH;
            let written = serializer.serialize(row, &mut buffer[cursor..cursor + computed])?;
            if written != computed {
                return Err(FlatRowError::SizeMismatch {
                    row,
                    computed,
                    written,
                });
            }
            cursor += computed;
        }
        offsets
    } else {
        serializer.serialize_framed(&rows, &mut buffer)?
    };

    log::debug!(
        "encoded {} rows into {} bytes ({} columns)",
        row_offsets.len(),
        buffer.len(),
        batch.num_columns()
    );
    Ok(EncodedRows {
        buffer,
        row_offsets,
    })
}

/// Decodes a batch produced by `encode_batch` back into Arrow columns.
///
/// `schema` may be the schema of the batch that was encoded: dictionary and
/// run-end encoded fields decode to their plain value types.
pub fn decode_batch(
    encoded: &EncodedRows,
    schema: SchemaRef,
    pool: &dyn MemoryPool,
) -> Result<RecordBatch> {
    let layout = RowLayout::try_new(resolve_schema(&schema))?;
    deserialize_framed(&[encoded.buffer.as_slice()], &layout, pool)
}

/// Reports how `batch` would encode without writing any row.
pub fn analyze_batch(batch: &RecordBatch) -> Result<EncodingStats> {
    let serializer = RowSerializer::new(batch)?;
    let layout = serializer.layout();
    let rows: Vec<usize> = (0..serializer.num_rows()).collect();
    let sizes = serializer.row_sizes(&rows)?;

    let total_row_bytes: usize = sizes.iter().sum();
    Ok(EncodingStats {
        num_rows: sizes.len(),
        fixed_size: layout.fixed_size(),
        fixed_row_size: layout.fixed_row_size(),
        total_row_bytes,
        framed_bytes: total_row_bytes + sizes.len() * FRAME_PREFIX_WIDTH,
        min_row_size: sizes.iter().copied().min().unwrap_or(0),
        max_row_size: sizes.iter().copied().max().unwrap_or(0),
        field_kinds: layout.fields().iter().map(|node| node.kind).collect(),
    })
}

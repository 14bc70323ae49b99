// --- IN: src/null_handling/bitmap.rs ---

//! Pure, stateless kernels for the null bitmap that opens every row and every
//! array blob.
//!
//! The bitmap is a run of little-endian 64-bit words. Field `i` lives at bit
//! `i % 64` of word `i / 64`; a set bit means the field is null. Because the
//! words are little-endian this is the same as bit `i % 8` of byte `i / 8`,
//! which is how the kernels address it.

use arrow::buffer::{BooleanBuffer, NullBuffer};

use crate::config::{BITMAP_WORD_BITS, SLOT_WIDTH};

//==================================================================================
// 1. Sizing
//==================================================================================

/// Number of 64-bit words needed to flag `field_count` fields.
#[inline]
pub fn bitmap_words(field_count: usize) -> usize {
    field_count.div_ceil(BITMAP_WORD_BITS)
}

/// Number of bytes occupied by the bitmap for `field_count` fields.
#[inline]
pub fn bitmap_bytes(field_count: usize) -> usize {
    bitmap_words(field_count) * SLOT_WIDTH
}

//==================================================================================
// 2. Bit Access
//==================================================================================

/// Marks `field_index` as null. `bitmap` must start at the first bitmap word.
#[inline]
pub fn set_null(bitmap: &mut [u8], field_index: usize) {
    bitmap[field_index >> 3] |= 1 << (field_index & 7);
}

/// Returns `true` if `field_index` is flagged null.
#[inline]
pub fn is_null(bitmap: &[u8], field_index: usize) -> bool {
    bitmap[field_index >> 3] & (1 << (field_index & 7)) != 0
}

//==================================================================================
// 3. Arrow Interop
//==================================================================================

/// Wraps per-value presence bits (set = present) as an Arrow validity buffer.
///
/// Returns `None` when every value is present so that arrays for non-nullable
/// fields never carry a validity buffer.
pub fn validity_to_null_buffer(validity: BooleanBuffer) -> Option<NullBuffer> {
    if validity.count_set_bits() == validity.len() {
        return None;
    }
    Some(NullBuffer::new(validity))
}

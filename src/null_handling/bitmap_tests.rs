//==================================================================================
// Unit Tests for the row-format null bitmap
//==================================================================================

use crate::null_handling::bitmap::*;
use arrow::buffer::BooleanBuffer;

#[test]
fn test_bitmap_words_rounds_up_to_word() {
    assert_eq!(bitmap_words(0), 0);
    assert_eq!(bitmap_words(1), 1);
    assert_eq!(bitmap_words(64), 1);
    assert_eq!(bitmap_words(65), 2);
    assert_eq!(bitmap_bytes(3), 8);
    assert_eq!(bitmap_bytes(129), 24);
}

#[test]
fn test_set_null_addresses_little_endian_words() {
    let mut bitmap = vec![0u8; bitmap_bytes(70)];
    set_null(&mut bitmap, 0);
    set_null(&mut bitmap, 9);
    set_null(&mut bitmap, 63);
    set_null(&mut bitmap, 64);

    let word0 = u64::from_le_bytes(bitmap[0..8].try_into().unwrap());
    let word1 = u64::from_le_bytes(bitmap[8..16].try_into().unwrap());
    assert_eq!(word0, (1 << 0) | (1 << 9) | (1 << 63));
    assert_eq!(word1, 1);
}

#[test]
fn test_is_null_reads_back_only_flagged_fields() {
    let mut bitmap = vec![0u8; bitmap_bytes(10)];
    set_null(&mut bitmap, 1);
    set_null(&mut bitmap, 8);

    let flagged: Vec<usize> = (0..10).filter(|&i| is_null(&bitmap, i)).collect();
    assert_eq!(flagged, vec![1, 8]);
}

#[test]
fn test_validity_to_null_buffer_drops_all_valid() {
    assert!(validity_to_null_buffer(BooleanBuffer::from(vec![true, true, true])).is_none());
    assert!(validity_to_null_buffer(BooleanBuffer::from(Vec::<bool>::new())).is_none());

    let nulls = validity_to_null_buffer(BooleanBuffer::from(vec![true, false, true])).unwrap();
    assert_eq!(nulls.null_count(), 1);
    assert!(nulls.is_null(1));
}

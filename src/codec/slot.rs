//! Reading and writing the 8-byte slots of the fixed region.
//!
//! A slot holds either an inline little-endian value in its low-order bytes,
//! or a packed reference: high 32 bits = offset from the start of the enclosing
//! row/array blob, low 32 bits = byte length of the referenced content.

use crate::config::SLOT_WIDTH;

/// A native value that can live inline in a slot.
pub trait SlotValue: Copy + Default {
    /// Writes the value into the low-order bytes of `slot`.
    fn write_slot(self, slot: &mut [u8]);
    /// Reads the value back from the low-order bytes of `slot`.
    fn read_slot(slot: &[u8]) -> Self;
}

macro_rules! impl_slot_value {
    ($($T:ty),+ $(,)?) => {
        $(
            impl SlotValue for $T {
                #[inline]
                fn write_slot(self, slot: &mut [u8]) {
                    let bytes = self.to_le_bytes();
                    slot[..bytes.len()].copy_from_slice(&bytes);
                }

                #[inline]
                fn read_slot(slot: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$T>()];
                    bytes.copy_from_slice(&slot[..std::mem::size_of::<$T>()]);
                    <$T>::from_le_bytes(bytes)
                }
            }
        )+
    };
}

impl_slot_value!(i8, i16, i32, i64, i128, u64, f32, f64);

/// Packs an (offset, length) pair into `slot`.
///
/// Both values must fit in 32 bits; the serializer rejects rows larger than
/// `u32::MAX` before writing anything.
#[inline]
pub fn write_reference(slot: &mut [u8], offset: usize, length: usize) {
    let packed = ((offset as u64) << 32) | (length as u64 & 0xFFFF_FFFF);
    slot[..SLOT_WIDTH].copy_from_slice(&packed.to_le_bytes());
}

/// Unpacks an (offset, length) pair from `slot`.
#[inline]
pub fn read_reference(slot: &[u8]) -> (usize, usize) {
    let mut bytes = [0u8; SLOT_WIDTH];
    bytes.copy_from_slice(&slot[..SLOT_WIDTH]);
    let packed = u64::from_le_bytes(bytes);
    ((packed >> 32) as usize, (packed & 0xFFFF_FFFF) as usize)
}

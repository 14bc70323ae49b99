//! Framing for rows packed contiguously into one buffer.
//!
//! A framed row is a 4-byte little-endian length followed by that many bytes
//! of encoded row. A buffer holds zero or more framed rows back to back.

use crate::config::FRAME_PREFIX_WIDTH;
use crate::error::{FlatRowError, Result};

/// Writes the length prefix for a row of `row_len` bytes at the front of `dest`.
#[inline]
pub fn write_frame_prefix(dest: &mut [u8], row_len: usize) {
    dest[..FRAME_PREFIX_WIDTH].copy_from_slice(&(row_len as u32).to_le_bytes());
}

/// Iterator over the rows of a framed buffer.
#[derive(Debug, Clone)]
pub struct FramedRows<'a> {
    buffer: &'a [u8],
    position: usize,
}

/// Splits a framed buffer into its rows.
pub fn framed_rows(buffer: &[u8]) -> FramedRows<'_> {
    FramedRows {
        buffer,
        position: 0,
    }
}

impl<'a> Iterator for FramedRows<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.buffer.len() {
            return None;
        }
        let start = self.position;
        let Some(prefix) = self.buffer.get(start..start + FRAME_PREFIX_WIDTH) else {
            // Never yield anything after a broken frame.
            self.position = self.buffer.len();
            return Some(Err(FlatRowError::malformed(format!(
                "Truncated frame prefix at byte {} of {}",
                start,
                self.buffer.len()
            ))));
        };
        let mut len_bytes = [0u8; FRAME_PREFIX_WIDTH];
        len_bytes.copy_from_slice(prefix);
        let row_len = u32::from_le_bytes(len_bytes) as usize;

        let row_start = start + FRAME_PREFIX_WIDTH;
        match self.buffer.get(row_start..row_start + row_len) {
            Some(row) => {
                self.position = row_start + row_len;
                Some(Ok(row))
            }
            None => {
                self.position = self.buffer.len();
                Some(Err(FlatRowError::malformed(format!(
                    "Frame at byte {} declares {} bytes but only {} remain",
                    start,
                    row_len,
                    self.buffer.len() - row_start
                ))))
            }
        }
    }
}

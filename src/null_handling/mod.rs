//! This module serves as the public API for all null-handling logic within the
//! flatrow core.
//!
//! The row format records nullability out of band: one bitmap per row and one
//! per array blob, both using the same word-rounded layout. This module is
//! PURE RUST and knows nothing about slots or variable content.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// The kernel for packing and unpacking row-format null bitmaps.
pub mod bitmap;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use bitmap::{bitmap_bytes, bitmap_words, is_null, set_null, validity_to_null_buffer};

//==================================================================================
// 3. Unit Tests (Module-level integration tests)
//==================================================================================

#[cfg(test)]
mod bitmap_tests;

//! The row codec engine: sizing, writing and reading flat rows.
//!
//! Data flow for one batch:
//!
//!   1. `vector::resolve_batch` flattens dictionary and run-end encoded columns.
//!   2. `RowSerializer` pairs the `RowLayout` with typed `ColumnReader`s.
//!   3. The sizer reports each row's exact size; the caller allocates.
//!   4. The serializer writes each row into the caller's buffer.
//!   5. `deserialize` / `deserialize_framed` rebuild an Arrow batch from rows,
//!      allocating through a `MemoryPool`.
//!
//! Steps 3 and 4 take `&self` and touch only their own row, so disjoint rows
//! may be sized and written from several threads at once.

//==================================================================================
// 1. Module Declarations
//==================================================================================

pub(crate) mod columns;
pub mod deserializer;
pub mod framing;
pub mod serializer;
pub(crate) mod sizer;
pub mod slot;
pub mod vector;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use deserializer::{deserialize, deserialize_framed};
pub use framing::{framed_rows, write_frame_prefix, FramedRows};
pub use serializer::RowSerializer;
pub use vector::{resolve_batch, resolve_data_type, resolve_encodings, resolve_schema};

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
pub(crate) mod test_utils;

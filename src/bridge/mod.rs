// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the batch-at-a-time public API of the flatrow library. The
// `codec` engine works one row at a time against caller-owned buffers; the
// bridge wraps it for callers that simply want a whole `RecordBatch` turned into
// bytes and back.
//
// Data Flow (Encoding):
//
//   1. [Stateless API (encode_batch)]   -> Receives `&RecordBatch`
//         |
//         `-> a. Builds a `RowSerializer` (resolves encodings, plans the layout)
//         |
//         `-> b. Sizes every row, allocates one buffer, writes framed rows
//
//   2. [EncodedRows]                    -> Framed buffer + per-row offsets
//
//
// Data Flow (Decoding):
//
//   1. [Stateless API (decode_batch)]   -> Receives `&EncodedRows` + schema
//         |
//         `-> a. Plans the `RowLayout` for the schema
//         |
//         `-> b. Calls `codec::deserialize_framed` with the caller's pool
//
//   2. [RecordBatch]                    -> Returned to the caller
//
// ====================================================================================
pub(crate) mod format;
pub mod stateless_api;

// --- Low-Level Stateless API (for FFI and testing) ---
pub use stateless_api::{analyze_batch, decode_batch, encode_batch, encode_batch_with_config};

// --- Batch Containers ---
pub use format::{EncodedRows, EncodingStats};

#[cfg(test)]
mod tests;

// In: src/config.rs

//! The single source of truth for flatrow wire constants and codec configuration.
//!
//! The wire constants are dictated by the external row-oriented consumer. They
//! are pinned here and are not configurable: changing any of them is a breaking
//! format change.
//!
//! `CodecConfig` only tunes how the codec checks its own work. It is created once
//! at the application boundary (e.g. from a JSON document or Python keyword
//! arguments) and passed down by reference.

use arrow_schema::TimeUnit;
use serde::{Deserialize, Serialize};

use crate::error::Result;

//==================================================================================
// I. Pinned Wire Constants
//==================================================================================

/// Width in bytes of every fixed slot, at every nesting level.
pub const SLOT_WIDTH: usize = 8;

/// Number of null flags held by one bitmap word.
pub const BITMAP_WORD_BITS: usize = 64;

/// Decimals with a precision up to and including this value are stored inline
/// as an 8-byte unscaled integer. Anything wider goes to the variable region.
pub const SHORT_DECIMAL_MAX_PRECISION: u8 = 18;

/// Physical size of a long decimal in the variable region.
pub const LONG_DECIMAL_WIDTH: usize = 16;

/// The only timestamp precision the consumer understands.
pub const TIMESTAMP_UNIT: TimeUnit = TimeUnit::Microsecond;

/// Size of the little-endian row length prefix used when rows are concatenated.
pub const FRAME_PREFIX_WIDTH: usize = 4;

/// Size of the element count that opens an array blob.
pub const ARRAY_COUNT_WIDTH: usize = 4;

/// Size of the keys-array length that opens a map blob.
pub const MAP_HEADER_WIDTH: usize = 8;

//==================================================================================
// II. Codec Configuration
//==================================================================================

/// Runtime knobs for the batch-level helpers in `bridge`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// If true, every serialized row is checked against its precomputed size and
    /// a mismatch is reported as an error instead of being trusted.
    #[serde(default = "default_true")]
    pub verify_row_sizes: bool,

    /// Upper bound for a single encoded row. Framing stores the row length in a
    /// `u32`, so this can never exceed `u32::MAX`.
    #[serde(default = "default_max_row_bytes")]
    pub max_row_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            verify_row_sizes: true,
            max_row_bytes: default_max_row_bytes(),
        }
    }
}

impl CodecConfig {
    /// Parses a config from JSON, filling omitted fields with their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: CodecConfig = serde_json::from_str(json)?;
        config.max_row_bytes = config.max_row_bytes.min(u32::MAX as usize);
        Ok(config)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

fn default_max_row_bytes() -> usize {
    u32::MAX as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let config = CodecConfig::from_json("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_from_json_clamps_row_limit_to_frame_prefix() {
        let config =
            CodecConfig::from_json(r#"{"verify_row_sizes": false, "max_row_bytes": 99999999999}"#)
                .unwrap();
        assert!(!config.verify_row_sizes);
        assert_eq!(config.max_row_bytes, u32::MAX as usize);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(CodecConfig::from_json("[").is_err());
    }
}

//! This module defines the strongly-typed kind system the row format is
//! dispatched on.
//!
//! `RowKind` is the closed set of kinds the encoder understands. Every Arrow
//! type entering the codec is mapped onto it exactly once, by the layout planner.

pub mod row_kind;

// Re-export the main type(s) for easier access.
pub use row_kind::{DecimalWidth, RowKind};

//! The layout planner: static, per-type-tree facts about the flat row format.
//!
//! Nothing in this module looks at data. Given a schema it decides, once, which
//! fields are inline-fixed, where each slot starts, and how large the fixed
//! region of every nested level is.

pub mod planner;

pub use planner::{
    array_fixed_size, fixed_region_size, fixed_slot_width, is_fixed_width, LayoutNode, RowLayout,
};

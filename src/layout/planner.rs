// In: src/layout/planner.rs

//! The layout planner for the flat row format.
//!
//! This module turns a type tree into a `LayoutNode` tree once, up front. Every
//! later stage (sizing, writing, reading) dispatches on the cached `RowKind` of
//! each node instead of re-inspecting Arrow types per value.
//!
//! All decisions here are pure functions of the type tree.

use arrow_schema::{DataType, FieldRef, SchemaRef};

use crate::config::{ARRAY_COUNT_WIDTH, SLOT_WIDTH};
use crate::error::{FlatRowError, Result};
use crate::null_handling::bitmap_bytes;
use crate::types::RowKind;

//==================================================================================
// 1. Free Layout Functions
//==================================================================================

/// Width of one fixed slot. Every slot is 8 bytes regardless of the logical
/// width of the value it holds.
#[inline]
pub const fn fixed_slot_width() -> usize {
    SLOT_WIDTH
}

/// Size of the null bitmap plus one slot per field.
#[inline]
pub fn fixed_region_size(field_count: usize) -> usize {
    bitmap_bytes(field_count) + field_count * SLOT_WIDTH
}

/// Size of an array blob before any element variable content.
#[inline]
pub fn array_fixed_size(element_count: usize) -> usize {
    ARRAY_COUNT_WIDTH + fixed_region_size(element_count)
}

/// Returns `true` if a value of this node lives entirely inside its slot.
#[inline]
pub fn is_fixed_width(node: &LayoutNode) -> bool {
    node.kind.is_fixed_width()
}

//==================================================================================
// 2. Layout Tree
//==================================================================================

/// One node of the cached layout tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub kind: RowKind,
    /// The Arrow type this node was planned from. Decoders rebuild arrays of
    /// exactly this type.
    pub data_type: DataType,
    /// Array: `[element]`. Map: `[key, value]`. Row: fields in declaration order.
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    /// Plans a single type-tree node and all of its descendants.
    pub fn try_new(data_type: &DataType) -> Result<Self> {
        let kind = RowKind::from_arrow_type(data_type)?;
        let children = match data_type {
            DataType::List(element) => vec![Self::try_new(element.data_type())?],
            DataType::Map(entries, _) => {
                let (key, value) = map_key_value_fields(entries)?;
                vec![
                    Self::try_new(key.data_type())?,
                    Self::try_new(value.data_type())?,
                ]
            }
            DataType::Struct(fields) => {
                if fields.is_empty() {
                    return Err(FlatRowError::UnsupportedType(
                        "Nested ROW types must have at least one field".to_string(),
                    ));
                }
                fields
                    .iter()
                    .map(|f| Self::try_new(f.data_type()))
                    .collect::<Result<Vec<_>>>()?
            }
            _ => Vec::new(),
        };
        Ok(Self {
            kind,
            data_type: data_type.clone(),
            children,
        })
    }

    pub fn is_fixed_width(&self) -> bool {
        is_fixed_width(self)
    }

    /// `Some(size)` when every child of a row node is inline-fixed, meaning
    /// every value of this row type has the same encoded size.
    pub fn fixed_row_size(&self) -> Option<usize> {
        fixed_size_of(&self.children)
    }
}

/// Extracts the key and value fields from a map's entries field.
pub(crate) fn map_key_value_fields(entries: &FieldRef) -> Result<(&FieldRef, &FieldRef)> {
    match entries.data_type() {
        DataType::Struct(kv) if kv.len() == 2 => Ok((&kv[0], &kv[1])),
        other => Err(FlatRowError::UnsupportedType(format!(
            "Map entries must be a two-field struct, got {:?}",
            other
        ))),
    }
}

fn fixed_size_of(fields: &[LayoutNode]) -> Option<usize> {
    fields
        .iter()
        .all(LayoutNode::is_fixed_width)
        .then(|| fixed_region_size(fields.len()))
}

//==================================================================================
// 3. Top-Level Row Layout
//==================================================================================

/// The cached layout of a top-level row type.
///
/// Built once per schema and shared by the sizer, serializer and deserializer.
#[derive(Debug, Clone)]
pub struct RowLayout {
    schema: SchemaRef,
    fields: Vec<LayoutNode>,
    bitmap_bytes: usize,
    fixed_size: usize,
    fixed_row_size: Option<usize>,
}

impl RowLayout {
    pub fn try_new(schema: SchemaRef) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .map(|f| LayoutNode::try_new(f.data_type()))
            .collect::<Result<Vec<_>>>()?;
        let field_count = fields.len();
        log::trace!(
            "planned row layout: {} fields, fixed region {} bytes",
            field_count,
            fixed_region_size(field_count)
        );
        let fixed_row_size = fixed_size_of(&fields);
        Ok(Self {
            schema,
            fields,
            bitmap_bytes: bitmap_bytes(field_count),
            fixed_size: fixed_region_size(field_count),
            fixed_row_size,
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn fields(&self) -> &[LayoutNode] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn bitmap_bytes(&self) -> usize {
        self.bitmap_bytes
    }

    /// Size of the null bitmap plus all top-level slots.
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    /// Byte offset of field `index`'s slot from the start of the row.
    /// Its null flag is bit `index` of the bitmap.
    pub fn slot_offset(&self, index: usize) -> usize {
        self.bitmap_bytes + index * SLOT_WIDTH
    }

    /// `Some(size)` when every row of this layout encodes to the same size.
    pub fn fixed_row_size(&self) -> Option<usize> {
        self.fixed_row_size
    }
}

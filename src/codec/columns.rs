//! The typed accessor tree the sizer and serializer walk.
//!
//! A `ColumnReader` pairs one layout node with the concrete Arrow array holding
//! its values. Building the tree performs every downcast once, so per-row work
//! is a plain `match` on a closed set of variants.

use std::ops::Range;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Date32Array, Decimal128Array,
    Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, ListArray,
    MapArray, StringArray, StructArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{
    Date32Type, Decimal128Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, TimestampMicrosecondType,
};

use crate::codec::slot::SlotValue;
use crate::error::{FlatRowError, Result};
use crate::layout::LayoutNode;
use crate::types::{DecimalWidth, RowKind};

/// One column of input data, downcast according to its layout node.
#[derive(Debug, Clone)]
pub(crate) enum ColumnReader {
    Boolean(BooleanArray),
    TinyInt(Int8Array),
    SmallInt(Int16Array),
    Integer(Int32Array),
    BigInt(Int64Array),
    Real(Float32Array),
    Double(Float64Array),
    Varchar(StringArray),
    Varbinary(BinaryArray),
    Unknown,
    ShortDecimal(Decimal128Array),
    LongDecimal(Decimal128Array),
    Timestamp(TimestampMicrosecondArray),
    Date(Date32Array),
    Array {
        array: ListArray,
        element: Box<ColumnReader>,
    },
    Map {
        array: MapArray,
        keys: Box<ColumnReader>,
        values: Box<ColumnReader>,
    },
    Row {
        array: StructArray,
        fields: Vec<ColumnReader>,
    },
}

fn mismatch(node: &LayoutNode, array: &dyn Array) -> FlatRowError {
    FlatRowError::TypeMismatch(format!(
        "Layout expects {} ({:?}) but the column holds {:?}",
        node.kind,
        node.data_type,
        array.data_type()
    ))
}

macro_rules! downcast_primitive {
    ($node:expr, $array:expr, $T:ty) => {
        $array
            .as_primitive_opt::<$T>()
            .cloned()
            .ok_or_else(|| mismatch($node, $array.as_ref()))?
    };
}

impl ColumnReader {
    /// Builds the accessor tree for `array`, checking it against `node`.
    pub(crate) fn try_new(node: &LayoutNode, array: &ArrayRef) -> Result<Self> {
        if array.data_type() != &node.data_type {
            return Err(mismatch(node, array.as_ref()));
        }
        let reader = match node.kind {
            RowKind::Boolean => ColumnReader::Boolean(
                array
                    .as_boolean_opt()
                    .cloned()
                    .ok_or_else(|| mismatch(node, array.as_ref()))?,
            ),
            RowKind::TinyInt => ColumnReader::TinyInt(downcast_primitive!(node, array, Int8Type)),
            RowKind::SmallInt => {
                ColumnReader::SmallInt(downcast_primitive!(node, array, Int16Type))
            }
            RowKind::Integer => ColumnReader::Integer(downcast_primitive!(node, array, Int32Type)),
            RowKind::BigInt => ColumnReader::BigInt(downcast_primitive!(node, array, Int64Type)),
            RowKind::Real => ColumnReader::Real(downcast_primitive!(node, array, Float32Type)),
            RowKind::Double => ColumnReader::Double(downcast_primitive!(node, array, Float64Type)),
            RowKind::Varchar => ColumnReader::Varchar(
                array
                    .as_string_opt::<i32>()
                    .cloned()
                    .ok_or_else(|| mismatch(node, array.as_ref()))?,
            ),
            RowKind::Varbinary => ColumnReader::Varbinary(
                array
                    .as_binary_opt::<i32>()
                    .cloned()
                    .ok_or_else(|| mismatch(node, array.as_ref()))?,
            ),
            RowKind::Unknown => ColumnReader::Unknown,
            RowKind::Decimal {
                precision, width, ..
            } => {
                let decimals = downcast_primitive!(node, array, Decimal128Type);
                match width {
                    DecimalWidth::Short => {
                        // Inline slots hold an i64; wider values cannot be represented.
                        decimals.validate_decimal_precision(precision)?;
                        ColumnReader::ShortDecimal(decimals)
                    }
                    DecimalWidth::Long => ColumnReader::LongDecimal(decimals),
                }
            }
            RowKind::Timestamp => {
                ColumnReader::Timestamp(downcast_primitive!(node, array, TimestampMicrosecondType))
            }
            RowKind::Date => ColumnReader::Date(downcast_primitive!(node, array, Date32Type)),
            RowKind::Array => {
                let list = array
                    .as_list_opt::<i32>()
                    .cloned()
                    .ok_or_else(|| mismatch(node, array.as_ref()))?;
                let element = Self::try_new(&node.children[0], list.values())?;
                ColumnReader::Array {
                    array: list,
                    element: Box::new(element),
                }
            }
            RowKind::Map => {
                let map = array
                    .as_map_opt()
                    .cloned()
                    .ok_or_else(|| mismatch(node, array.as_ref()))?;
                let keys = Self::try_new(&node.children[0], map.keys())?;
                let values = Self::try_new(&node.children[1], map.values())?;
                ColumnReader::Map {
                    array: map,
                    keys: Box::new(keys),
                    values: Box::new(values),
                }
            }
            RowKind::Row => {
                let row = array
                    .as_struct_opt()
                    .cloned()
                    .ok_or_else(|| mismatch(node, array.as_ref()))?;
                let fields = node
                    .children
                    .iter()
                    .zip(row.columns())
                    .map(|(child, column)| Self::try_new(child, column))
                    .collect::<Result<Vec<_>>>()?;
                ColumnReader::Row { array: row, fields }
            }
        };
        Ok(reader)
    }

    /// Returns `true` if the value at `index` must be flagged null.
    pub(crate) fn is_null(&self, index: usize) -> bool {
        match self {
            ColumnReader::Boolean(a) => a.is_null(index),
            ColumnReader::TinyInt(a) => a.is_null(index),
            ColumnReader::SmallInt(a) => a.is_null(index),
            ColumnReader::Integer(a) => a.is_null(index),
            ColumnReader::BigInt(a) => a.is_null(index),
            ColumnReader::Real(a) => a.is_null(index),
            ColumnReader::Double(a) => a.is_null(index),
            ColumnReader::Varchar(a) => a.is_null(index),
            ColumnReader::Varbinary(a) => a.is_null(index),
            ColumnReader::Unknown => true,
            ColumnReader::ShortDecimal(a) | ColumnReader::LongDecimal(a) => a.is_null(index),
            ColumnReader::Timestamp(a) => a.is_null(index),
            ColumnReader::Date(a) => a.is_null(index),
            ColumnReader::Array { array, .. } => array.is_null(index),
            ColumnReader::Map { array, .. } => array.is_null(index),
            ColumnReader::Row { array, .. } => array.is_null(index),
        }
    }

    /// Returns `true` if non-null values live entirely inside their slot.
    pub(crate) fn is_fixed_width(&self) -> bool {
        !matches!(
            self,
            ColumnReader::Varchar(_)
                | ColumnReader::Varbinary(_)
                | ColumnReader::LongDecimal(_)
                | ColumnReader::Array { .. }
                | ColumnReader::Map { .. }
                | ColumnReader::Row { .. }
        )
    }

    /// Writes the inline value at `index` into a zeroed slot.
    pub(crate) fn write_inline(&self, index: usize, slot: &mut [u8]) {
        match self {
            ColumnReader::Boolean(a) => slot[0] = a.value(index) as u8,
            ColumnReader::TinyInt(a) => a.value(index).write_slot(slot),
            ColumnReader::SmallInt(a) => a.value(index).write_slot(slot),
            ColumnReader::Integer(a) => a.value(index).write_slot(slot),
            ColumnReader::BigInt(a) => a.value(index).write_slot(slot),
            ColumnReader::Real(a) => a.value(index).write_slot(slot),
            ColumnReader::Double(a) => a.value(index).write_slot(slot),
            // Precision was validated when the reader was built.
            ColumnReader::ShortDecimal(a) => (a.value(index) as i64).write_slot(slot),
            ColumnReader::Timestamp(a) => a.value(index).write_slot(slot),
            ColumnReader::Date(a) => a.value(index).write_slot(slot),
            ColumnReader::Unknown => {}
            ColumnReader::Varchar(_)
            | ColumnReader::Varbinary(_)
            | ColumnReader::LongDecimal(_)
            | ColumnReader::Array { .. }
            | ColumnReader::Map { .. }
            | ColumnReader::Row { .. } => {
                unreachable!("variable-width value written inline")
            }
        }
    }

    /// Range of child indices making up the collection at `index`.
    pub(crate) fn child_range(&self, index: usize) -> Range<usize> {
        let offsets = match self {
            ColumnReader::Array { array, .. } => array.value_offsets(),
            ColumnReader::Map { array, .. } => array.value_offsets(),
            _ => unreachable!("child_range on a non-collection column"),
        };
        offsets[index] as usize..offsets[index + 1] as usize
    }
}

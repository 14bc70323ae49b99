//! This module defines the closed set of value kinds the flat row format can carry.

use crate::config::{SHORT_DECIMAL_MAX_PRECISION, TIMESTAMP_UNIT};
use crate::error::FlatRowError;
use arrow_schema::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical width class of a decimal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalWidth {
    /// Inline 8-byte unscaled integer.
    Short,
    /// 16-byte unscaled integer in the variable region.
    Long,
}

impl DecimalWidth {
    /// Classifies a decimal purely by its digit precision.
    pub fn from_precision(precision: u8) -> Self {
        if precision <= SHORT_DECIMAL_MAX_PRECISION {
            DecimalWidth::Short
        } else {
            DecimalWidth::Long
        }
    }
}

/// The canonical kind of a type-tree node, as seen by the row format.
///
/// Composite kinds carry no children here; the children live in the
/// `LayoutNode` tree built by the layout planner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Varchar,
    Varbinary,
    Unknown,
    Decimal {
        precision: u8,
        scale: i8,
        width: DecimalWidth,
    },
    Timestamp,
    Date,
    Array,
    Map,
    Row,
}

impl RowKind {
    /// Converts an Arrow `DataType` into a `RowKind`.
    ///
    /// Types outside the supported set are rejected here, before any row is
    /// sized or written.
    pub fn from_arrow_type(data_type: &DataType) -> Result<Self, FlatRowError> {
        match data_type {
            DataType::Boolean => Ok(Self::Boolean),
            DataType::Int8 => Ok(Self::TinyInt),
            DataType::Int16 => Ok(Self::SmallInt),
            DataType::Int32 => Ok(Self::Integer),
            DataType::Int64 => Ok(Self::BigInt),
            DataType::Float32 => Ok(Self::Real),
            DataType::Float64 => Ok(Self::Double),
            DataType::Utf8 => Ok(Self::Varchar),
            DataType::Binary => Ok(Self::Varbinary),
            DataType::Null => Ok(Self::Unknown),
            DataType::Decimal128(precision, scale) => Ok(Self::Decimal {
                precision: *precision,
                scale: *scale,
                width: DecimalWidth::from_precision(*precision),
            }),
            DataType::Timestamp(unit, _) if *unit == TIMESTAMP_UNIT => Ok(Self::Timestamp),
            DataType::Date32 => Ok(Self::Date),
            DataType::List(_) => Ok(Self::Array),
            DataType::Map(_, _) => Ok(Self::Map),
            DataType::Struct(_) => Ok(Self::Row),
            dt => Err(FlatRowError::UnsupportedType(format!(
                "Cannot map Arrow type {:?} onto the flat row format",
                dt
            ))),
        }
    }

    /// Returns `true` if values of this kind live entirely inside their slot.
    pub fn is_fixed_width(&self) -> bool {
        match self {
            Self::Boolean
            | Self::TinyInt
            | Self::SmallInt
            | Self::Integer
            | Self::BigInt
            | Self::Real
            | Self::Double
            | Self::Unknown
            | Self::Timestamp
            | Self::Date => true,
            Self::Decimal { width, .. } => *width == DecimalWidth::Short,
            Self::Varchar | Self::Varbinary | Self::Array | Self::Map | Self::Row => false,
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal {
                precision, scale, ..
            } => write!(f, "DECIMAL({}, {})", precision, scale),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::TinyInt => write!(f, "TINYINT"),
            Self::SmallInt => write!(f, "SMALLINT"),
            Self::Integer => write!(f, "INTEGER"),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Real => write!(f, "REAL"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Varchar => write!(f, "VARCHAR"),
            Self::Varbinary => write!(f, "VARBINARY"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Date => write!(f, "DATE"),
            Self::Array => write!(f, "ARRAY"),
            Self::Map => write!(f, "MAP"),
            Self::Row => write!(f, "ROW"),
        }
    }
}

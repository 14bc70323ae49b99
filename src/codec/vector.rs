//! Resolution of value-sharing encodings in the columnar input.
//!
//! Arrow dictionary arrays and run-end encoded arrays alias one physical value
//! across many logical rows. The row format has no such concept, so before any
//! layout decision every column is rewritten into its plain logical form, at
//! every nesting depth. Columns that need no rewriting are returned as-is.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, ListArray, MapArray, RunArray, StructArray, UInt32Array,
};
use arrow::compute::{cast, take};
use arrow::datatypes::{Int16Type, Int32Type, Int64Type, RunEndIndexType};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Field, FieldRef, Fields, Schema, SchemaRef};

use crate::error::{FlatRowError, Result};

/// Rewrites every column of `batch` into plain (non-dictionary, non-run-end)
/// arrays, adjusting the schema to match.
pub fn resolve_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let resolved = resolve_encodings(column)?;
        fields.push(retype(field, resolved.data_type()));
        columns.push(resolved);
    }
    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Returns the logical, plain form of `array`.
pub fn resolve_encodings(array: &ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::Dictionary(_, value_type) => {
            let plain = cast(array.as_ref(), value_type)?;
            resolve_encodings(&plain)
        }
        DataType::RunEndEncoded(run_ends, _) => {
            let plain = match run_ends.data_type() {
                DataType::Int16 => expand_runs::<Int16Type>(array)?,
                DataType::Int32 => expand_runs::<Int32Type>(array)?,
                DataType::Int64 => expand_runs::<Int64Type>(array)?,
                other => {
                    return Err(FlatRowError::UnsupportedType(format!(
                        "Run-end index type {:?}",
                        other
                    )))
                }
            };
            resolve_encodings(&plain)
        }
        DataType::List(element) => {
            let list = array.as_list::<i32>();
            let values = resolve_encodings(list.values())?;
            if Arc::ptr_eq(&values, list.values()) {
                return Ok(Arc::clone(array));
            }
            let element = Arc::new(retype(element, values.data_type()));
            let rebuilt =
                ListArray::try_new(element, list.offsets().clone(), values, list.nulls().cloned())?;
            Ok(Arc::new(rebuilt))
        }
        DataType::Struct(fields) => {
            let row = array.as_struct();
            let (columns, changed) = resolve_all(row.columns())?;
            if !changed {
                return Ok(Arc::clone(array));
            }
            let fields: Fields = fields
                .iter()
                .zip(&columns)
                .map(|(f, c)| retype(f, c.data_type()))
                .collect();
            let rebuilt = StructArray::try_new(fields, columns, row.nulls().cloned())?;
            Ok(Arc::new(rebuilt))
        }
        DataType::Map(entries_field, ordered) => {
            let map = array.as_map();
            let entries: ArrayRef = Arc::new(map.entries().clone());
            let resolved = resolve_encodings(&entries)?;
            if Arc::ptr_eq(&resolved, &entries) {
                return Ok(Arc::clone(array));
            }
            let entries_field = Arc::new(retype(entries_field, resolved.data_type()));
            let rebuilt = MapArray::try_new(
                entries_field,
                map.offsets().clone(),
                resolved.as_struct().clone(),
                map.nulls().cloned(),
                *ordered,
            )?;
            Ok(Arc::new(rebuilt))
        }
        _ => Ok(Arc::clone(array)),
    }
}

/// Returns `schema` with every dictionary and run-end encoded type replaced by
/// the plain type `resolve_batch` produces for it.
pub fn resolve_schema(schema: &SchemaRef) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| retype(f, &resolve_data_type(f.data_type())))
        .collect();
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// The plain logical form of `data_type`, at every nesting depth.
pub fn resolve_data_type(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Dictionary(_, value_type) => resolve_data_type(value_type),
        DataType::RunEndEncoded(_, values) => resolve_data_type(values.data_type()),
        DataType::List(element) => {
            DataType::List(Arc::new(retype(element, &resolve_data_type(element.data_type()))))
        }
        DataType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|f| retype(f, &resolve_data_type(f.data_type())))
                .collect(),
        ),
        DataType::Map(entries, ordered) => DataType::Map(
            Arc::new(retype(entries, &resolve_data_type(entries.data_type()))),
            *ordered,
        ),
        other => other.clone(),
    }
}

fn resolve_all(columns: &[ArrayRef]) -> Result<(Vec<ArrayRef>, bool)> {
    let mut changed = false;
    let resolved = columns
        .iter()
        .map(|c| {
            let r = resolve_encodings(c)?;
            changed |= !Arc::ptr_eq(&r, c);
            Ok(r)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((resolved, changed))
}

/// Expands a run-end encoded array by gathering each logical row's run value.
fn expand_runs<R: RunEndIndexType>(array: &ArrayRef) -> Result<ArrayRef> {
    let runs = array
        .as_any()
        .downcast_ref::<RunArray<R>>()
        .ok_or_else(|| {
            FlatRowError::TypeMismatch(format!(
                "Expected a run-end encoded array, got {:?}",
                array.data_type()
            ))
        })?;
    let indices: UInt32Array = (0..runs.len())
        .map(|i| runs.get_physical_index(i) as u32)
        .collect();
    Ok(take(runs.values().as_ref(), &indices, None)?)
}

fn retype(field: &FieldRef, data_type: &DataType) -> Field {
    field.as_ref().clone().with_data_type(data_type.clone())
}

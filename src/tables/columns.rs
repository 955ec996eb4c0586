//! Typed column access on record batches.

use crate::error::{EtlError, Result};
use arrow::array::{Array, ArrowPrimitiveType, PrimitiveArray, StringArray};
use arrow::record_batch::RecordBatch;

pub(crate) fn column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    table: &'static str,
    name: &str,
) -> Result<&'a A> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| EtlError::TypeMismatch {
            table,
            column: name.to_string(),
            reason: "column is missing".to_string(),
        })?;
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| EtlError::TypeMismatch {
            table,
            column: name.to_string(),
            reason: format!("unexpected type {}", array.data_type()),
        })
}

pub(crate) fn optional_string(array: &StringArray, row: usize) -> Option<String> {
    array.is_valid(row).then(|| array.value(row).to_string())
}

pub(crate) fn required_string(
    array: &StringArray,
    row: usize,
    table: &'static str,
    name: &str,
) -> Result<String> {
    optional_string(array, row).ok_or_else(|| null_error(table, name, row))
}

pub(crate) fn optional<T: ArrowPrimitiveType>(
    array: &PrimitiveArray<T>,
    row: usize,
) -> Option<T::Native> {
    array.is_valid(row).then(|| array.value(row))
}

pub(crate) fn required<T: ArrowPrimitiveType>(
    array: &PrimitiveArray<T>,
    row: usize,
    table: &'static str,
    name: &str,
) -> Result<T::Native> {
    optional(array, row).ok_or_else(|| null_error(table, name, row))
}

fn null_error(table: &'static str, name: &str, row: usize) -> EtlError {
    EtlError::TypeMismatch {
        table,
        column: name.to_string(),
        reason: format!("unexpected null at row {}", row),
    }
}

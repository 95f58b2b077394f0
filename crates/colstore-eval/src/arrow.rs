//! Arrow export of column values.
//!
//! Invalid rows, and date-times that were never set, become nulls. Masking
//! is a view concern and does not affect the exported array.

use std::sync::Arc;

use arrow_array::{
    ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow_schema::{DataType, Field, TimeUnit};
use colstore_common::{ColumnMode, to_millis};

use crate::buffer::ColumnBuffer;
use crate::column::Column;

pub fn data_type(mode: ColumnMode) -> DataType {
    match mode {
        ColumnMode::Double => DataType::Float64,
        ColumnMode::Integer => DataType::Int32,
        ColumnMode::BigInt => DataType::Int64,
        ColumnMode::Text => DataType::Utf8,
        ColumnMode::DateTime => DataType::Timestamp(TimeUnit::Millisecond, None),
    }
}

impl Column {
    pub fn arrow_field(&self) -> Field {
        Field::new(self.name(), data_type(self.column_mode()), true)
    }

    pub fn to_arrow(&self) -> ArrayRef {
        let core = self.core();
        let valid = |row: usize| !core.invalid().is_set(row);
        match core.buffer() {
            ColumnBuffer::Double(v) => Arc::new(Float64Array::from(
                v.iter()
                    .enumerate()
                    .map(|(row, x)| valid(row).then_some(*x))
                    .collect::<Vec<_>>(),
            )),
            ColumnBuffer::Integer(v) => Arc::new(Int32Array::from(
                v.iter()
                    .enumerate()
                    .map(|(row, x)| valid(row).then_some(*x))
                    .collect::<Vec<_>>(),
            )),
            ColumnBuffer::BigInt(v) => Arc::new(Int64Array::from(
                v.iter()
                    .enumerate()
                    .map(|(row, x)| valid(row).then_some(*x))
                    .collect::<Vec<_>>(),
            )),
            ColumnBuffer::Text(v) => Arc::new(StringArray::from(
                v.iter()
                    .enumerate()
                    .map(|(row, x)| valid(row).then_some(x.as_str()))
                    .collect::<Vec<_>>(),
            )),
            ColumnBuffer::DateTime(v) => Arc::new(TimestampMillisecondArray::from(
                v.iter()
                    .enumerate()
                    .map(|(row, x)| x.filter(|_| valid(row)).map(|dt| to_millis(&dt)))
                    .collect::<Vec<_>>(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Array;

    #[test]
    fn test_invalid_rows_export_as_null() {
        let col = Column::from_doubles("x", vec![1.0, 2.0, 3.0]);
        col.set_invalid_row(1, true);
        let arr = col.to_arrow();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.null_count(), 1);
        assert!(arr.is_null(1));
        assert_eq!(col.arrow_field().data_type(), &DataType::Float64);
    }

    #[test]
    fn test_unset_date_times_are_null() {
        let col = Column::from_date_times("t", vec![None, colstore_common::from_millis(5)]);
        let arr = col.to_arrow();
        assert!(arr.is_null(0));
        assert!(!arr.is_null(1));
    }
}

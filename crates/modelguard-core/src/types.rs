use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::compute;
use arrow::datatypes::{DataType, Float64Type};
use arrow::util::display::array_value_to_string;
use arrow_array::{cast::AsArray, Float64Array};

use crate::errors::{GuardError, GuardResult};

pub type Batch = arrow::record_batch::RecordBatch;

/// Look up a column by name.
pub fn column<'a>(batch: &'a Batch, name: &str) -> GuardResult<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| GuardError::MissingColumn(name.to_string()))
}

/// Names of the columns whose arrow type is numeric, in schema order.
pub fn numeric_columns(batch: &Batch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .filter(|f| f.data_type().is_numeric())
        .map(|f| f.name().clone())
        .collect()
}

/// Widen a numeric array to `Float64`, keeping nulls.
pub fn as_float64(array: &dyn Array) -> GuardResult<Float64Array> {
    if let Some(values) = array.as_primitive_opt::<Float64Type>() {
        return Ok(values.clone());
    }
    let casted: Arc<dyn Array> = compute::cast(array, &DataType::Float64)?;
    Ok(casted.as_primitive::<Float64Type>().clone())
}

/// Render the value at `index` as its display string, `None` for nulls.
pub fn value_label(array: &dyn Array, index: usize) -> GuardResult<Option<String>> {
    if array.is_null(index) {
        return Ok(None);
    }
    Ok(Some(array_value_to_string(array, index)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use arrow_array::{Int64Array, StringArray};

    fn sample_batch() -> Batch {
        let schema = Schema::new(vec![
            Field::new("age", DataType::Int64, true),
            Field::new("sex", DataType::Utf8, true),
            Field::new("bmi", DataType::Float64, true),
        ]);
        Batch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![Some(19), None, Some(28)])),
                Arc::new(StringArray::from(vec![Some("female"), Some("male"), None])),
                Arc::new(Float64Array::from(vec![27.9, 33.77, 33.0])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_columns_in_schema_order() {
        assert_eq!(numeric_columns(&sample_batch()), vec!["age", "bmi"]);
    }

    #[test]
    fn test_missing_column() {
        let batch = sample_batch();
        assert!(column(&batch, "age").is_ok());
        assert!(matches!(
            column(&batch, "charges"),
            Err(GuardError::MissingColumn(name)) if name == "charges"
        ));
    }

    #[test]
    fn test_integer_column_widens_with_nulls() {
        let batch = sample_batch();
        let values = as_float64(column(&batch, "age").unwrap().as_ref()).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values.null_count(), 1);
        assert_eq!(values.value(2), 28.0);
    }

    #[test]
    fn test_value_label() {
        let batch = sample_batch();
        let sex = column(&batch, "sex").unwrap();
        assert_eq!(value_label(sex.as_ref(), 0).unwrap(), Some("female".to_string()));
        assert_eq!(value_label(sex.as_ref(), 2).unwrap(), None);
    }
}

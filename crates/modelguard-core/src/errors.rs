use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    /// A zero-length array was given where values are required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A name that does not match any known category (output type, file format)
    #[error("Unknown category '{value}'. Expected one of: {expected}")]
    UnknownCategory { value: String, expected: String },

    /// Column not found in the dataset
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    /// Table not registered in the runner catalog
    #[error("Table '{0}' not found")]
    MissingTable(String),

    /// Two arrays that must be aligned index-for-index have different lengths
    #[error("Length mismatch: '{left}' has {left_len} values but '{right}' has {right_len}")]
    LengthMismatch {
        left: String,
        right: String,
        left_len: usize,
        right_len: usize,
    },

    /// A NaN or infinite value in an input array
    #[error("Non-finite input: '{name}' holds {value} at index {index}")]
    NonFiniteInput { name: String, index: usize, value: f64 },

    /// The metric cannot be computed for the given input
    #[error("Undefined metric: {0}")]
    UndefinedMetric(String),

    /// The Arrow kernel produced an error (e.g., unsupported cast)
    #[error("Arrow computation error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type GuardResult<T> = Result<T, GuardError>;

impl GuardError {
    pub fn unknown_category<I, S>(value: &str, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expected = expected
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        GuardError::UnknownCategory {
            value: value.to_string(),
            expected,
        }
    }

    pub fn ensure_aligned(left: &str, left_len: usize, right: &str, right_len: usize) -> GuardResult<()> {
        if left_len != right_len {
            return Err(GuardError::LengthMismatch {
                left: left.to_string(),
                right: right.to_string(),
                left_len,
                right_len,
            });
        }
        Ok(())
    }

    pub fn ensure_finite(name: &str, values: &[f64]) -> GuardResult<()> {
        match values.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(GuardError::NonFiniteInput {
                name: name.to_string(),
                index,
                value: values[index],
            }),
            None => Ok(()),
        }
    }
}

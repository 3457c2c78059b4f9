use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains no table")]
    NoTable,
    #[error("Table file not found: '{table_path}'")]
    FileNotFound { table_path: String },
    #[error("Threshold for '{kind}' check on table '{table}' must not be negative, found {value}")]
    InvalidThreshold {
        table: String,
        kind: String,
        value: f64,
    },
    #[error("Range for column '{column}' is empty: min {min} is greater than max {max}")]
    InvalidBounds { column: String, min: f64, max: f64 },
    #[error("Column '{column}' has an invalid type - {message}")]
    ColumnType { column: String, message: String },
    #[error("Consistency check references unknown table '{table}'")]
    UnknownTable { table: String },
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Missing required column '{column}' in {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("Invalid value in {table} table, row {row}, column '{column}': '{value}'")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("City matching would need {pairs} comparisons, limit is {limit}")]
    MatchBudgetExceeded { pairs: u64, limit: u64 },

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("insufficient data: {actual} completed items, {required} required")]
    InsufficientData { required: usize, actual: usize },

    #[error("malformed record {key}: {message}")]
    MalformedRecord { key: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid period format: {0}")]
    PeriodParse(String),

    #[error("record source error: {0}")]
    Source(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

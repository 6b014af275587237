use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

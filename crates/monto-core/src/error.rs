//! Error types for monto core

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid source uri: {0}")]
    InvalidUri(String),

    #[error("Malformed range: start {start} > end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Mapping offset out of bounds: {bound} > {limit}")]
    MappingOutOfBounds { bound: usize, limit: usize },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

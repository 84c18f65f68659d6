//! Error types for the energy balance engine

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid calibration factor: {0}")]
    InvalidCalibration(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),
}

/// Failures reported by upstream data collaborators.
///
/// These are distinct from "no data": a provider that has nothing for a user
/// returns an empty result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

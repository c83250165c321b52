//! Error types for Aloft
//!
//! Decisions themselves never fail; these errors only surface at the edges
//! where JSON or configuration enters or leaves the engine.

use thiserror::Error;

/// Errors that can occur while loading input or encoding output
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

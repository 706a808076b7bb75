//! Error types surfaced at the relay boundary.
//!
//! Template render failures have no variant here; they are recovered
//! inside [`crate::prompt`] and never reach a caller.

use thiserror::Error;

use crate::inference::GatewayError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid history format: {0}")]
    MalformedImport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Inference backend error: {0}")]
    Gateway(#[from] GatewayError),
}

pub type Result<T> = std::result::Result<T, RelayError>;

//! Error types for the risk assessment engine
//!
//! Telemetry problems never surface here: scorers treat missing or malformed
//! fields as neutral values. These errors cover the envelope around the core
//! (session documents, configuration, encoding) and the external model seam.

use thiserror::Error;

/// Errors that can occur while assessing a session
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Failed to parse session document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported source kind: {0}")]
    UnsupportedSource(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by an external text-generation capability.
///
/// Callers inside the engine never propagate these; they log them and fall
/// back to the deterministic policy for the current turn.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model endpoint is not reachable at {0}")]
    Connection(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("Model capability is not configured")]
    NotConfigured,
}

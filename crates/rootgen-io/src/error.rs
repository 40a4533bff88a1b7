//! Error types for mesh encoding and decoding.

use rootgen_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur while reading or writing a mesh payload.
#[derive(Error, Debug)]
pub enum IoError {
    /// The XML document is malformed.
    #[error("XML error: {0}")]
    Xml(String),

    /// A base64 payload could not be decoded.
    #[error("base64 decode error: {0}")]
    Base64(String),

    /// The payload is well-formed but its content is invalid.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The payload uses a feature this reader does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The decoded mesh violates the mesh invariants.
    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, IoError>;

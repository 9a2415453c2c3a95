//! Error types for binding resolution, request building and response parsing.
//!
//! # Design
//! One enum covers every stage. The assembler records a `BindingError` per
//! operation instead of failing the whole document, so the variants carry
//! owned messages and are `Clone` to travel inside a `Resolution`.

use thiserror::Error;

/// Errors produced while resolving or using an HTTP operation binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A required attribute is missing, or an attribute value is invalid.
    #[error("extension validation failed: {0}")]
    ExtensionValidation(String),

    /// A location is malformed, or a placeholder has no parameter value.
    #[error("template resolution failed: {0}")]
    TemplateResolution(String),

    /// The serialization kind is unknown or has no codec.
    #[error("unsupported serialization: {0}")]
    UnsupportedSerialization(String),

    /// A body could not be encoded or decoded with the selected codec.
    #[error("codec error: {0}")]
    Codec(String),

    /// Resolution was cancelled or hit its deadline before finishing.
    #[error("resolution cancelled")]
    Cancelled,

    /// The server returned a status outside 2xx.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

pub type Result<T, E = BindingError> = std::result::Result<T, E>;

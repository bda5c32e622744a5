//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding, decoding or converting values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// NaN has no canonical form and cannot be stored or compared.
    #[error("NaN values are forbidden")]
    NaNForbidden,

    /// A value had the wrong shape for the requested conversion.
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        /// What the caller asked for.
        expected: &'static str,
        /// The type name of the value that was found.
        found: &'static str,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create an unexpected type error.
    pub fn unexpected_type(expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedType { expected, found }
    }
}

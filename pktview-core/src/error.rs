//! Error types for pktview-core.
//!
//! This module provides structured error types for all pktview-core operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`DecodeError`] - Errors raised while decoding a single packet
//! - [`SetupError`] - Errors raised while building registries and plugin sets
//! - [`DomainError`] - Errors from constructing core values out of range
//!
//! Decode errors never escape [`Parser::parse`](crate::Parser::parse); they are
//! folded into the parsed text. Only setup and domain errors reach callers.

use thiserror::Error;

/// Main error type for pktview-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error while decoding packet bytes
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error while building registries or instantiating plugins
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Value outside its allowed domain
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Errors raised by a decoder while reading a packet payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Read past the end of the available bytes
    #[error("unexpected end of data at offset {position}: need {needed} bytes, have {available}")]
    UnexpectedEnd {
        position: usize,
        needed: usize,
        available: usize,
    },

    /// Field value that the decoder cannot accept
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// String field that is not valid UTF-8
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// Decoder panicked; the panic was caught by the parser
    #[error("decoder panicked: {message}")]
    Panicked { message: String },
}

impl DecodeError {
    /// Shorthand for [`DecodeError::InvalidField`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised while building registries or plugin sets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The same opcode was registered twice in one protocol
    #[error("{protocol}: opcode {opcode:#06x} registered twice")]
    DuplicateOpcode { protocol: &'static str, opcode: u16 },

    /// Plugin type that cannot be constructed without arguments
    #[error("{type_name} has no zero-argument constructor")]
    MissingConstructor { type_name: &'static str },
}

/// Errors for values outside their allowed domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Raw direction value that is neither to-server nor to-client
    #[error("invalid packet direction: {0}")]
    InvalidDirection(u8),

    /// Constructor argument rejected
    #[error("invalid argument {argument}: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },
}

/// Result type for decoders.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

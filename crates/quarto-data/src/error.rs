/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for quarto-data.
 */

use std::fmt::Display;
use thiserror::Error;

/// Result type alias for quarto-data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building, addressing, patching or
/// (de)serializing data values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// The host value contains something that has no canonical representation.
    ///
    /// Inside a container this is never fatal: the offending element is
    /// replaced by `Null` (or dropped, for unsupported map keys).
    #[error("Unsupported type: {message}")]
    UnsupportedType { message: String },

    /// A path segment cannot address the container it is applied to.
    #[error("Malformed path `{path}`: segment `{segment}` cannot be resolved")]
    MalformedPath { path: String, segment: String },

    /// Text codec input is not in the `<tag>body` form, is not valid JSON,
    /// or does not hold a JSON object.
    #[error("Invalid data format: {message}")]
    InvalidFormat { message: String },

    /// Text codec tag is not one we know how to decode.
    #[error("Unrecognized data format `{tag}`")]
    UnrecognizedFormat { tag: String },

    /// A patch update path (or the parent of a `set` path) does not resolve.
    #[error("Invalid query `{query}`: no value at this path")]
    InvalidQuery { query: String },

    /// A patch update path resolves to something other than a mapping.
    #[error("Unsupported merge target at `{query}`: only mappings can be updated")]
    UnsupportedMergeTarget { query: String },

    /// A document root must always be a mapping.
    #[error("Document root must be a mapping, found {kind}")]
    RootNotMapping { kind: String },

    /// A value could not be decoded into the requested host type.
    #[error("Decode error: {message}")]
    Decode { message: String },
}

impl DataError {
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedType {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_query(query: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl serde::ser::Error for DataError {
    fn custom<T: Display>(msg: T) -> Self {
        DataError::unsupported(msg.to_string())
    }
}

impl serde::de::Error for DataError {
    fn custom<T: Display>(msg: T) -> Self {
        DataError::decode(msg.to_string())
    }
}

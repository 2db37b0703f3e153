//! Error type for chapter typesetting
//!
//! Resource exhaustion is not an error here: the flush policy handles it.
//! Only malformed markup, failing byte sources and broken stylesheets
//! surface as a [`TypesetError`].

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Top-level error type for mu-typeset operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypesetError {
    /// Malformed markup
    Parse {
        /// Byte offset in the source where parsing failed.
        position: u64,
        /// Parser diagnostic.
        message: String,
    },
    /// I/O error (description only, since `std::io::Error` is not `Clone`)
    Io(String),
    /// CSS parsing error
    Css(String),
}

impl TypesetError {
    /// Byte offset of a parse error, if this is one.
    pub fn position(&self) -> Option<u64> {
        match self {
            TypesetError::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl fmt::Display for TypesetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypesetError::Parse { position, message } => {
                write!(f, "Parse error at byte {}: {}", position, message)
            }
            TypesetError::Io(msg) => write!(f, "I/O error: {}", msg),
            TypesetError::Css(msg) => write!(f, "CSS error: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TypesetError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for TypesetError {
    fn from(err: std::io::Error) -> Self {
        TypesetError::Io(err.to_string())
    }
}

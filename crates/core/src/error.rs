//! Error types for meshstate
//!
//! This module defines the error type shared by every codec layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall into the categories reported by [`Error::kind`]:
//!
//! - **Schema**: an expected attribute or variable is absent
//! - **TypeMismatch**: stored element type incompatible with the requested
//!   type, or a narrowing conversion that would overflow
//! - **Partition**: size mismatch on a non-resizing read, or a selection
//!   the stored blocks cannot satisfy
//! - **Backend**: open/close/step failures and filesystem errors
//! - **Usage**: lifecycle misuse and malformed records
//!
//! Only backend errors are fatal for the whole session; everything else is
//! fatal for the single read or write that triggered it.

use crate::types::ElementKind;
use std::io;
use thiserror::Error;

/// Result type alias for meshstate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for meshstate
#[derive(Debug, Error)]
pub enum Error {
    /// A mandatory attribute was not found
    #[error("Required attribute missing: {path}")]
    MissingAttribute {
        /// Attribute path
        path: String,
    },

    /// A mandatory variable was not found
    #[error("Required variable missing: {path}")]
    MissingVariable {
        /// Variable path
        path: String,
    },

    /// Stored element type cannot be converted to the requested type
    #[error("Type mismatch for {path}: stored {stored}, requested {requested}")]
    TypeMismatch {
        /// Variable path
        path: String,
        /// Element type in the container
        stored: ElementKind,
        /// Element type requested by the caller
        requested: ElementKind,
    },

    /// Stored attribute value has a different type than requested
    #[error("Attribute type mismatch for {path}: stored {stored}, requested {requested}")]
    AttributeTypeMismatch {
        /// Attribute path
        path: String,
        /// Type name of the stored value
        stored: &'static str,
        /// Type name requested by the caller
        requested: &'static str,
    },

    /// A narrowing conversion would lose the value
    #[error("Value out of range for {path} at element {index}: cannot narrow {stored} to {requested}")]
    NarrowingOverflow {
        /// Variable path
        path: String,
        /// Index of the first offending element
        index: usize,
        /// Element type in the container (or on the host side for writes)
        stored: ElementKind,
        /// Target element type
        requested: ElementKind,
    },

    /// Caller data does not match the stored or declared extent
    #[error("Size mismatch for {path}: expected {expected} elements, found {actual}")]
    SizeMismatch {
        /// Variable path
        path: String,
        /// Size given by the container or the declared extent
        expected: usize,
        /// Size of the caller's data or destination
        actual: usize,
    },

    /// Stored blocks cannot satisfy this participant's selection
    #[error("Partition mismatch for {path}: {detail}")]
    Partition {
        /// Variable path
        path: String,
        /// Human-readable description
        detail: String,
    },

    /// Byte-stream record could not be encoded or decoded
    #[error("Byte-stream error for {path}: {detail}")]
    Stream {
        /// Variable path
        path: String,
        /// Human-readable description
        detail: String,
    },

    /// Container backend failure (open, close, step boundaries, corruption)
    #[error("Backend error: {0}")]
    Backend(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Expected attribute/variable absent
    Schema,
    /// Element type or width incompatibility
    TypeMismatch,
    /// Size or partition mismatch
    Partition,
    /// Backend I/O failure
    Backend,
    /// Lifecycle misuse or malformed record
    Usage,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingAttribute { .. } | Error::MissingVariable { .. } => ErrorKind::Schema,
            Error::TypeMismatch { .. }
            | Error::AttributeTypeMismatch { .. }
            | Error::NarrowingOverflow { .. } => ErrorKind::TypeMismatch,
            Error::SizeMismatch { .. } | Error::Partition { .. } => ErrorKind::Partition,
            Error::Backend(_) | Error::Io(_) => ErrorKind::Backend,
            Error::Stream { .. } | Error::InvalidOperation(_) => ErrorKind::Usage,
        }
    }

    /// True if the session that raised this error cannot continue
    pub fn is_fatal_for_session(&self) -> bool {
        self.kind() == ErrorKind::Backend
    }

    /// The container path this error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::MissingAttribute { path }
            | Error::MissingVariable { path }
            | Error::TypeMismatch { path, .. }
            | Error::AttributeTypeMismatch { path, .. }
            | Error::NarrowingOverflow { path, .. }
            | Error::SizeMismatch { path, .. }
            | Error::Partition { path, .. }
            | Error::Stream { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Convenience constructor for partition errors
    pub fn partition(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Partition {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Convenience constructor for byte-stream errors
    pub fn stream(path: impl Into<String>, detail: impl ToString) -> Self {
        Error::Stream {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

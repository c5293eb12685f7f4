//! Error types for Canopy.

use alloc::string::String;
use core::fmt;

/// Result type alias for Canopy operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Canopy operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed filter pattern text.
    Syntax {
        message: String,
        /// Byte offset of the offending character (input length at end of input).
        position: usize,
    },
    /// An accessor was invoked for a node or attribute outside its change-set.
    Usage {
        message: String,
    },
    /// A query declaration failed validation.
    InvalidQuery {
        message: String,
    },
    /// A tree operation would break the single-parent, acyclic shape of the tree.
    Hierarchy {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax { message, position } => {
                write!(f, "Syntax error at {}: {}", position, message)
            }
            Error::Usage { message } => {
                write!(f, "Usage error: {}", message)
            }
            Error::InvalidQuery { message } => {
                write!(f, "Invalid query: {}", message)
            }
            Error::Hierarchy { message } => {
                write!(f, "Hierarchy error: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage {
            message: message.into(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Error::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a hierarchy error.
    pub fn hierarchy(message: impl Into<String>) -> Self {
        Error::Hierarchy {
            message: message.into(),
        }
    }

    /// Returns true if this is a syntax error.
    #[inline]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    /// Returns true if this is a usage error.
    #[inline]
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage { .. })
    }
}

//! Error types for Canopy.

use crate::document::DocId;
use alloc::string::String;
use core::fmt;

/// Result type alias for Canopy operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for publication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Document not found in a collection.
    NotFound {
        collection: String,
        id: DocId,
    },
    /// A publication with the same name is already registered.
    DuplicatePublication {
        name: String,
    },
    /// No publication registered under the given name.
    UnknownPublication {
        name: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { collection, id } => {
                write!(f, "Document {} not found in collection {}", id, collection)
            }
            Error::DuplicatePublication { name } => {
                write!(f, "Publication already registered: {}", name)
            }
            Error::UnknownPublication { name } => {
                write!(f, "Unknown publication: {}", name)
            }
        }
    }
}

impl Error {
    /// Creates a not found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<DocId>) -> Self {
        Error::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a duplicate publication error.
    pub fn duplicate_publication(name: impl Into<String>) -> Self {
        Error::DuplicatePublication { name: name.into() }
    }

    /// Creates an unknown publication error.
    pub fn unknown_publication(name: impl Into<String>) -> Self {
        Error::UnknownPublication { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("users", "u1");
        assert!(err.to_string().contains("u1"));
        assert!(err.to_string().contains("users"));

        let err = Error::duplicate_publication("feed");
        assert!(err.to_string().contains("feed"));

        let err = Error::unknown_publication("nope");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_error_constructors() {
        match Error::not_found("users", "u1") {
            Error::NotFound { collection, id } => {
                assert_eq!(collection, "users");
                assert_eq!(id.as_str(), "u1");
            }
            _ => panic!("Wrong error type"),
        }
    }
}

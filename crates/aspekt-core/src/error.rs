//! Error types shared by every aspekt crate.

/// Errors that can occur while resolving, building, or writing records.
///
/// Absence of a value (unset optional field, non-matching union member,
/// wildcard over an empty array) is never represented here; resolvers
/// report it as a normal result.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A referenced field, union member, or role is not declared by the schema.
    #[error("Schema mismatch: `{name}` is not declared on `{type_name}`")]
    SchemaMismatch {
        /// Schema that was consulted
        type_name: String,
        /// Name that could not be found
        name: String,
    },

    /// The path asks for something the resolver never supports.
    #[error("Unsupported operation: {message}")]
    UnsupportedOperation {
        /// What was attempted
        message: String,
    },

    /// A value's structural shape differs from what the caller asked for.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Requested shape or type
        expected: String,
        /// Actual shape or type
        found: String,
    },

    /// Malformed wire input.
    #[error("Decode error: {message}")]
    Decode {
        /// What went wrong, including the location when known
        message: String,
    },

    /// Path text that does not follow the path grammar.
    #[error("Invalid path `{path}`: {message}")]
    InvalidPath {
        /// The offending path text
        path: String,
        /// Why it was rejected
        message: String,
    },

    /// A schema definition is inconsistent (duplicate fields, members, ...).
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        /// Description of the inconsistency
        message: String,
    },

    /// Text that is not a well-formed URN.
    #[error("Invalid URN: {value}")]
    InvalidUrn {
        /// The rejected text
        value: String,
    },

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bulk transport failed to execute a request.
    #[error("Transport error: {message}")]
    Transport {
        /// Transport-provided description
        message: String,
    },

    /// An operation was attempted on a closed resource.
    #[error("{resource} is closed")]
    Closed {
        /// The closed resource
        resource: String,
    },
}

/// Convenience `Result` type alias for aspekt operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Only transport and I/O failures are transient; everything else
    /// describes a problem with the input itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Io(_) => true,
            Error::SchemaMismatch { .. } => false,
            Error::UnsupportedOperation { .. } => false,
            Error::TypeMismatch { .. } => false,
            Error::Decode { .. } => false,
            Error::InvalidPath { .. } => false,
            Error::InvalidSchema { .. } => false,
            Error::InvalidUrn { .. } => false,
            Error::Serialization(_) => false,
            Error::Config { .. } => false,
            Error::Closed { .. } => false,
        }
    }

    /// Creates a schema mismatch error.
    pub fn schema_mismatch<T, N>(type_name: T, name: N) -> Self
    where
        T: Into<String>,
        N: Into<String>,
    {
        Error::SchemaMismatch {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Error::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch<E, F>(expected: E, found: F) -> Self
    where
        E: Into<String>,
        F: Into<String>,
    {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Error::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema<S: Into<String>>(message: S) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    /// Creates a closed-resource error.
    pub fn closed<S: Into<String>>(resource: S) -> Self {
        Error::Closed {
            resource: resource.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_display() {
        let err = Error::schema_mismatch("com.example.AspectFoo", "missing");
        assert_eq!(
            err.to_string(),
            "Schema mismatch: `missing` is not declared on `com.example.AspectFoo`"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_type_mismatch_fields() {
        let err = Error::type_mismatch("string", "record");
        let Error::TypeMismatch { expected, found } = err else {
            unreachable!("Expected TypeMismatch error variant");
        };
        assert_eq!(expected, "string");
        assert_eq!(found, "record");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::transport("connection reset").is_retryable());
        assert!(!Error::unsupported("index").is_retryable());
        assert!(!Error::decode("bad").is_retryable());
        assert!(!Error::closed("bulk processor").is_retryable());
    }

    #[test]
    fn test_io_error_is_retryable() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_error.into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_serde_error_not_retryable() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let err: Error = serde_err.into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_path_display() {
        let err = Error::invalid_path("a/b", "path must begin with `/`");
        assert_eq!(err.to_string(), "Invalid path `a/b`: path must begin with `/`");
    }

    #[test]
    fn test_closed_display() {
        assert_eq!(Error::closed("bulk processor").to_string(), "bulk processor is closed");
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}

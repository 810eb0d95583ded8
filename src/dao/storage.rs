use std::error::Error;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxedCause = Box<dyn Error + Send + Sync>;

/// Failure of a score store, tagged with the backend that raised it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("{backend} store unavailable: {source}")]
    Unavailable {
        /// Backend name (`memory`, `mongodb`, `couchdb`).
        backend: &'static str,
        /// Driver or transport failure.
        #[source]
        source: BoxedCause,
    },
    /// The backend answered with data that does not fit the score model.
    #[error("{backend} store returned unreadable data: {source}")]
    Corrupt {
        /// Backend name.
        backend: &'static str,
        /// Decoding failure.
        #[source]
        source: BoxedCause,
    },
}

impl StorageError {
    /// Wrap a connectivity or write failure.
    pub fn unavailable(backend: &'static str, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            backend,
            source: Box::new(source),
        }
    }

    /// Wrap a decoding failure.
    pub fn corrupt(backend: &'static str, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Corrupt {
            backend,
            source: Box::new(source),
        }
    }

    /// Name of the backend that failed.
    pub fn backend(&self) -> &'static str {
        match self {
            StorageError::Unavailable { backend, .. } | StorageError::Corrupt { backend, .. } => {
                backend
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_backend_and_cause() {
        let err = StorageError::unavailable("couchdb", std::io::Error::other("connection reset"));
        assert_eq!(err.backend(), "couchdb");
        assert_eq!(err.to_string(), "couchdb store unavailable: connection reset");
    }
}

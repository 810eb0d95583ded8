use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;

pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB score store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("invalid MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB unreachable after {attempts} ping(s)")]
    Unreachable {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed")]
    Ping {
        #[source]
        source: MongoError,
    },
    #[error("failed to create index `{index}` on `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("write to `{collection}` for `{key}` failed")]
    Write {
        collection: &'static str,
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("read from `{collection}` ({scope}) failed")]
    Read {
        collection: &'static str,
        scope: String,
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether the driver failed to map a stored document onto its model.
    pub fn is_decode_failure(&self) -> bool {
        match self {
            MongoDaoError::Read { source, .. } => {
                matches!(*source.kind, ErrorKind::BsonDeserialization(_))
            }
            _ => false,
        }
    }
}

//! CouchDB score store reached over its HTTP API.

mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchScoreStore;

use crate::dao::storage::StorageError;

const BACKEND: &str = "couchdb";

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Decode { .. } | CouchDaoError::MalformedDocument { .. } => {
                StorageError::corrupt(BACKEND, err)
            }
            other => StorageError::unavailable(BACKEND, other),
        }
    }
}

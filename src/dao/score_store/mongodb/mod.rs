//! MongoDB score store: a `scores` collection of runs and a `leaderboard`
//! collection holding one best entry per player.

mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoScoreStore;

use crate::dao::storage::StorageError;

const BACKEND: &str = "mongodb";

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        if err.is_decode_failure() {
            StorageError::corrupt(BACKEND, err)
        } else {
            StorageError::unavailable(BACKEND, err)
        }
    }
}

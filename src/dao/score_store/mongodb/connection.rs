use std::time::Duration;

use mongodb::{Client, Database, bson::doc, error::Error as MongoError};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const PING_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(4);

pub async fn ping(database: &Database) -> Result<(), MongoError> {
    database.run_command(doc! { "ping": 1 }).await.map(drop)
}

/// Open a client for `config` and return its database once a ping succeeds.
pub async fn connect_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut attempt = 1;
    let mut delay = FIRST_RETRY_DELAY;
    loop {
        match ping(&database).await {
            Ok(()) => {
                debug!(database = %config.database_name, attempt, "MongoDB reachable");
                return Ok(database);
            }
            Err(source) if attempt >= PING_ATTEMPTS => {
                return Err(MongoDaoError::Unreachable {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                warn!(attempt, retry_in_ms = delay.as_millis(), error = %err, "MongoDB not answering yet");
                sleep(delay).await;
                attempt += 1;
                delay = (delay * 2).min(MAX_RETRY_DELAY);
            }
        }
    }
}

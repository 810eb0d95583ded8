use std::{env, time::Duration};

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "collocation_dash";
const APP_NAME: &str = "collocation-dash-back";
/// Keeps health pings short so the supervisor notices outages quickly.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Connection settings for [`super::MongoScoreStore`].
#[derive(Clone, Debug)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri` and target `database`, or the default database when `None`.
    pub async fn new(uri: &str, database: Option<&str>) -> MongoResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());
        options
            .server_selection_timeout
            .get_or_insert(SERVER_SELECTION_TIMEOUT);

        Ok(Self {
            options,
            database_name: database
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(DEFAULT_DATABASE)
                .to_owned(),
        })
    }

    /// `MONGO_URI` (defaults to a local server) and `MONGO_DB`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.to_owned());
        let database = env::var("MONGO_DB").ok();
        Self::new(&uri, database.as_deref()).await
    }
}

use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DB: &str = "collocation_dash";

/// Where the CouchDB score database lives and how to log in.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL without trailing slash, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding score and leaderboard documents.
    pub database: String,
    /// Basic-auth user and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    pub fn new(base_url: &str, database: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
            database: database
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_DB)
                .to_owned(),
            credentials: None,
        }
    }

    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional `COUCH_USERNAME` / `COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var("COUCH_BASE_URL").map_err(|_| CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        })?;
        let database = env::var("COUCH_DB").ok();

        let mut config = Self::new(&base_url, database.as_deref());
        config.credentials = env::var("COUCH_USERNAME")
            .ok()
            .zip(env::var("COUCH_PASSWORD").ok());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_url_and_database() {
        let config = CouchConfig::new(" http://couch:5984/ ", Some("  "));

        assert_eq!(config.base_url, "http://couch:5984");
        assert_eq!(config.database, DEFAULT_DB);
        assert!(config.credentials.is_none());

        let named = CouchConfig::new("http://couch:5984", Some("scores"));
        assert_eq!(named.database, "scores");
    }
}

//! Failures of the CouchDB score store.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for CouchDB operations.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Errors raised while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The configured base URL cannot address a database.
    #[error("invalid CouchDB base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Building the HTTP client failed.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request never got a response.
    #[error("CouchDB request `{target}` failed")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with a status the store does not handle.
    #[error("unexpected CouchDB status {status} for `{target}`")]
    UnexpectedStatus { target: String, status: StatusCode },
    /// A document write lost a revision race.
    #[error("CouchDB revision conflict on `{doc_id}`")]
    Conflict { doc_id: String },
    /// The response body was not the expected JSON.
    #[error("failed to decode CouchDB response for `{target}`")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    /// A listed document did not match the expected model.
    #[error("malformed CouchDB document in `{target}`")]
    MalformedDocument {
        target: String,
        #[source]
        source: serde_json::Error,
    },
}

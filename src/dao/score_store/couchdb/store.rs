use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::dao::{
    models::{LeaderboardEntryEntity, ScoreEntity, rank_by_score},
    score_store::ScoreStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchLeaderboardDocument, CouchScoreDocument, END_SUFFIX,
        LEADERBOARD_PREFIX, leaderboard_doc_id, score_user_prefix,
    },
};

const ALL_DOCS: &str = "_all_docs";
/// Leaderboard upserts race on the document revision; retry a few times.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// CouchDB-backed [`ScoreStore`] implementation.
#[derive(Clone)]
pub struct CouchScoreStore {
    client: Client,
    database_url: Arc<Url>,
    credentials: Option<Arc<(String, String)>>,
}

impl CouchScoreStore {
    /// Connect to CouchDB, creating the score database when missing.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            database_url: Arc::new(database_url(&config)?),
            credentials: config.credentials.map(Arc::new),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    /// Build a request against the database, or one of its documents when `doc_id` is set.
    fn request(&self, method: Method, doc_id: Option<&str>) -> RequestBuilder {
        let mut url = Url::clone(&self.database_url);
        if let Some(doc_id) = doc_id
            && let Ok(mut segments) = url.path_segments_mut()
        {
            segments.push(doc_id);
        }

        let builder = self.client.request(method, url);
        match self.credentials.as_deref() {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, target: &str) -> CouchResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: target.to_owned(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let target = self.database_url.path().to_owned();
        let head = self
            .send(self.request(Method::HEAD, None), &target)
            .await?;

        match head.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self.send(self.request(Method::PUT, None), &target).await?;
                match created.status() {
                    // 412: another instance created it first.
                    status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => {
                        debug!(database = %target, "CouchDB score database ready");
                        Ok(())
                    }
                    status => Err(CouchDaoError::UnexpectedStatus { target, status }),
                }
            }
            status => Err(CouchDaoError::UnexpectedStatus { target, status }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::GET, Some(doc_id)), doc_id)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode {
                    target: doc_id.to_owned(),
                    source,
                }),
            status => Err(CouchDaoError::UnexpectedStatus {
                target: doc_id.to_owned(),
                status,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: Serialize,
    {
        let response = self
            .send(self.request(Method::PUT, Some(doc_id)).json(document), doc_id)
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                doc_id: doc_id.to_owned(),
            }),
            status => Err(CouchDaoError::UnexpectedStatus {
                target: doc_id.to_owned(),
                status,
            }),
        }
    }

    /// Every document whose id starts with `prefix`, in id order.
    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let query = [
            ("include_docs", "true".to_owned()),
            ("start_key", Value::from(prefix).to_string()),
            ("end_key", Value::from(format!("{prefix}{END_SUFFIX}")).to_string()),
        ];
        let response = self
            .send(self.request(Method::GET, Some(ALL_DOCS)).query(&query), ALL_DOCS)
            .await?;

        if !response.status().is_success() {
            return Err(CouchDaoError::UnexpectedStatus {
                target: ALL_DOCS.to_owned(),
                status: response.status(),
            });
        }

        let payload = response
            .json::<AllDocsResponse>()
            .await
            .map_err(|source| CouchDaoError::Decode {
                target: ALL_DOCS.to_owned(),
                source,
            })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                serde_json::from_value(doc).map_err(|source| CouchDaoError::MalformedDocument {
                    target: prefix.to_owned(),
                    source,
                })
            })
            .collect()
    }

    /// Keep the better of the stored and submitted entries, refreshing the display name.
    async fn upsert_leaderboard(&self, entry: LeaderboardEntryEntity) -> CouchResult<()> {
        let doc_id = leaderboard_doc_id(&entry.user_id);
        let document = match self
            .get_document::<CouchLeaderboardDocument>(&doc_id)
            .await?
        {
            Some(existing) => {
                let rev = existing.rev.clone();
                let current = LeaderboardEntryEntity::from(existing);
                let kept = if current.is_beaten_by(&entry) {
                    entry
                } else {
                    LeaderboardEntryEntity {
                        display_name: entry.display_name,
                        ..current
                    }
                };
                CouchLeaderboardDocument::from((kept, rev))
            }
            None => CouchLeaderboardDocument::from((entry, None)),
        };

        self.put_document(&doc_id, &document).await
    }
}

fn database_url(config: &CouchConfig) -> CouchResult<Url> {
    let invalid = |reason: String| CouchDaoError::InvalidBaseUrl {
        url: config.base_url.clone(),
        reason,
    };

    let mut url = Url::parse(&config.base_url).map_err(|err| invalid(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("URL cannot carry a path".into()))?
        .pop_if_empty()
        .push(&config.database);
    Ok(url)
}

impl ScoreStore for CouchScoreStore {
    fn persist_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document = CouchScoreDocument::from(score);
            Ok(store.put_document(&document.id, &document).await?)
        })
    }

    fn submit_leaderboard_entry(
        &self,
        entry: LeaderboardEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut attempt = 1;
            loop {
                match store.upsert_leaderboard(entry.clone()).await {
                    Err(CouchDaoError::Conflict { doc_id }) if attempt < MAX_WRITE_ATTEMPTS => {
                        debug!(%doc_id, attempt, "leaderboard revision conflict; retrying");
                        attempt += 1;
                    }
                    result => return Ok(result?),
                }
            }
        })
    }

    fn fetch_top_entries(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut entries: Vec<LeaderboardEntryEntity> = store
                .list_documents::<CouchLeaderboardDocument>(LEADERBOARD_PREFIX)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            rank_by_score(&mut entries, |entry| (entry.score, entry.recorded_at));
            entries.truncate(limit);
            Ok(entries)
        })
    }

    fn fetch_top_personal_scores(
        &self,
        user_id: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores: Vec<ScoreEntity> = store
                .list_documents::<CouchScoreDocument>(&score_user_prefix(&user_id))
                .await?
                .into_iter()
                .map(ScoreEntity::from)
                .filter(|score| score.user_id == user_id)
                .collect();
            rank_by_score(&mut scores, |score| (score.score, score.recorded_at));
            scores.truncate(limit);
            Ok(scores)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let target = store.database_url.path().to_owned();
            let response = store
                .send(store.request(Method::HEAD, None), &target)
                .await?;
            match response.status() {
                status if status.is_success() => Ok(()),
                status => Err(CouchDaoError::UnexpectedStatus { target, status }.into()),
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ensure_database().await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_appends_the_database_segment() {
        let url = database_url(&CouchConfig::new("http://couch:5984/", Some("scores"))).unwrap();
        assert_eq!(url.as_str(), "http://couch:5984/scores");

        let nested = database_url(&CouchConfig::new("http://proxy/couch", Some("scores"))).unwrap();
        assert_eq!(nested.as_str(), "http://proxy/couch/scores");
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let err = database_url(&CouchConfig::new("not a url", None)).unwrap_err();
        assert!(matches!(err, CouchDaoError::InvalidBaseUrl { .. }));
    }
}

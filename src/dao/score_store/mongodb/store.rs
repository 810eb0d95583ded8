use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::{connect_database, ping},
    error::{MongoDaoError, MongoResult},
    models::{MongoLeaderboardDocument, MongoScoreDocument, doc_id, ranking_sort},
};
use crate::dao::{
    models::{LeaderboardEntryEntity, ScoreEntity},
    score_store::ScoreStore,
    storage::StorageResult,
};

const SCORE_COLLECTION_NAME: &str = "scores";
const LEADERBOARD_COLLECTION_NAME: &str = "leaderboard";

/// MongoDB-backed [`ScoreStore`] implementation.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        ping(&database)
            .await
            .map_err(|source| MongoDaoError::Ping { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = connect_database(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = connect_database(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let scores = self.score_collection().await;
        let personal_index = IndexModel::builder()
            .keys(doc! {"user_id": 1, "score": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_user_idx".to_owned()))
                    .build(),
            )
            .build();
        scores
            .create_index(personal_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "user_id,score",
                source,
            })?;

        let leaderboard = self.leaderboard_collection().await;
        let ranking_index = IndexModel::builder()
            .keys(ranking_sort())
            .options(
                IndexOptions::builder()
                    .name(Some("leaderboard_rank_idx".to_owned()))
                    .build(),
            )
            .build();
        leaderboard
            .create_index(ranking_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: LEADERBOARD_COLLECTION_NAME,
                index: "score,recorded_at",
                source,
            })?;

        Ok(())
    }

    async fn score_collection(&self) -> Collection<MongoScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn leaderboard_collection(&self) -> Collection<MongoLeaderboardDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoLeaderboardDocument>(LEADERBOARD_COLLECTION_NAME)
    }

    async fn persist_score(&self, score: ScoreEntity) -> MongoResult<()> {
        let user_id = score.user_id.clone();
        let document: MongoScoreDocument = score.into();
        self.score_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: SCORE_COLLECTION_NAME,
                key: user_id,
                source,
            })?;
        Ok(())
    }

    async fn submit_leaderboard_entry(&self, entry: LeaderboardEntryEntity) -> MongoResult<()> {
        let user_id = entry.user_id.clone();
        let collection = self.leaderboard_collection().await;

        let existing: Option<LeaderboardEntryEntity> = collection
            .find_one(doc_id(&user_id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: LEADERBOARD_COLLECTION_NAME,
                scope: format!("entry of `{user_id}`"),
                source,
            })?
            .map(Into::into);

        let document: MongoLeaderboardDocument = match existing {
            Some(current) if !current.is_beaten_by(&entry) => LeaderboardEntryEntity {
                display_name: entry.display_name,
                ..current
            }
            .into(),
            _ => entry.into(),
        };

        collection
            .replace_one(doc_id(&user_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: LEADERBOARD_COLLECTION_NAME,
                key: user_id,
                source,
            })?;

        Ok(())
    }

    async fn fetch_top_entries(&self, limit: usize) -> MongoResult<Vec<LeaderboardEntryEntity>> {
        let read_error = |source| MongoDaoError::Read {
            collection: LEADERBOARD_COLLECTION_NAME,
            scope: format!("top {limit}"),
            source,
        };
        let documents: Vec<MongoLeaderboardDocument> = self
            .leaderboard_collection()
            .await
            .find(doc! {})
            .sort(ranking_sort())
            .limit(limit_as_i64(limit))
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn fetch_top_personal_scores(
        &self,
        user_id: String,
        limit: usize,
    ) -> MongoResult<Vec<ScoreEntity>> {
        let read_error = |source| MongoDaoError::Read {
            collection: SCORE_COLLECTION_NAME,
            scope: format!("top {limit} of `{user_id}`"),
            source,
        };
        let documents: Vec<MongoScoreDocument> = self
            .score_collection()
            .await
            .find(doc! {"user_id": user_id.as_str()})
            .sort(ranking_sort())
            .limit(limit_as_i64(limit))
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

fn limit_as_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl ScoreStore for MongoScoreStore {
    fn persist_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.persist_score(score).await.map_err(Into::into) })
    }

    fn submit_leaderboard_entry(
        &self,
        entry: LeaderboardEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .submit_leaderboard_entry(entry)
                .await
                .map_err(Into::into)
        })
    }

    fn fetch_top_entries(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.fetch_top_entries(limit).await.map_err(Into::into) })
    }

    fn fetch_top_personal_scores(
        &self,
        user_id: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .fetch_top_personal_scores(user_id, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

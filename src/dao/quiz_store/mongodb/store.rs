use std::time::SystemTime;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{DateTime, doc},
    options::{IndexOptions, ReturnDocument},
};
use tracing::warn;

use super::{
    config::MongoConfig,
    connection::open_database,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoCounterDocument, MongoLeaderboardRow, MongoPlayerDocument, MongoQuizContent,
        MongoQuizDocument, MongoQuizListDocument, MongoScoreDocument, doc_id,
        leaderboard_pipeline,
    },
};
use crate::dao::{
    models::{
        LeaderboardRowEntity, NewScoreEntity, PlayerEntity, QuizContentEntity, QuizEntity,
        QuizListItemEntity, ScoreEntity,
    },
    quiz_store::QuizStore,
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const PLAYER_COLLECTION_NAME: &str = "players";
const SCORE_COLLECTION_NAME: &str = "scores";
const COUNTER_COLLECTION_NAME: &str = "counters";

/// MongoDB-backed [`QuizStore`] implementation.
#[derive(Clone)]
pub struct MongoQuizStore {
    database: Database,
}

impl MongoQuizStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;
        let store = Self { database };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ping(&self) -> MongoResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = &self.database;

        let indexes: [(&'static str, &'static str, mongodb::bson::Document, bool); 4] = [
            (GAME_COLLECTION_NAME, "content_hash", doc! {"content_hash": 1}, true),
            (PLAYER_COLLECTION_NAME, "name", doc! {"name": 1}, true),
            (SCORE_COLLECTION_NAME, "game_id", doc! {"game_id": 1}, false),
            (SCORE_COLLECTION_NAME, "player_id", doc! {"player_id": 1}, false),
        ];

        for (collection_name, index_name, keys, unique) in indexes {
            let collection = database.collection::<mongodb::bson::Document>(collection_name);
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection_name}_{index_name}_idx")))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index: index_name,
                    source,
                })?;
        }

        Ok(())
    }

    fn collection(&self) -> Collection<MongoQuizDocument> {
        self.database.collection(GAME_COLLECTION_NAME)
    }

    fn player_collection(&self) -> Collection<MongoPlayerDocument> {
        self.database.collection(PLAYER_COLLECTION_NAME)
    }

    fn score_collection(&self) -> Collection<MongoScoreDocument> {
        self.database.collection(SCORE_COLLECTION_NAME)
    }

    /// Allocate the next integer id from the counters collection.
    async fn next_id(&self, counter: &'static str) -> MongoResult<i64> {
        let counters = self
            .database
            .collection::<MongoCounterDocument>(COUNTER_COLLECTION_NAME);

        let updated = counters
            .find_one_and_update(doc! {"_id": counter}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId { counter, source })?;

        updated
            .map(|document| document.seq)
            .ok_or(MongoDaoError::MissingCounter { counter })
    }

    async fn insert_quiz(
        &self,
        content: QuizContentEntity,
        created_at: SystemTime,
    ) -> MongoResult<QuizEntity> {
        let id = self.next_id(GAME_COLLECTION_NAME).await?;
        let quiz = QuizEntity {
            id,
            content,
            created_at,
        };
        let document: MongoQuizDocument = quiz.clone().into();

        self.collection()
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        index: "content_hash",
                        source,
                    }
                } else {
                    MongoDaoError::InsertQuiz { source }
                }
            })?;

        Ok(quiz)
    }

    async fn find_quiz(&self, id: i64) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .collection()
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadQuiz { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn find_quiz_by_hash(&self, content_hash: String) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .collection()
            .find_one(doc! {"content_hash": content_hash})
            .await
            .map_err(|source| MongoDaoError::LoadQuizByHash { source })?;

        Ok(document.map(Into::into))
    }

    async fn list_quizzes(&self) -> MongoResult<Vec<QuizListItemEntity>> {
        let collection = self
            .collection()
            .clone_with_type::<MongoQuizListDocument>();

        let documents: Vec<MongoQuizListDocument> = collection
            .find(doc! {})
            .projection(doc! {"_id": 1, "created_at": 1})
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn random_quiz(&self) -> MongoResult<Option<QuizEntity>> {
        let mut documents: Vec<MongoQuizDocument> = self
            .collection()
            .aggregate(vec![doc! {"$sample": {"size": 1}}])
            .with_type::<MongoQuizDocument>()
            .await
            .map_err(|source| MongoDaoError::SampleQuiz { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::SampleQuiz { source })?;

        Ok(documents.pop().map(Into::into))
    }

    async fn quiz_exists(&self, id: i64) -> MongoResult<bool> {
        let count = self
            .collection()
            .count_documents(doc_id(id))
            .limit(1)
            .await
            .map_err(|source| MongoDaoError::LoadQuiz { id, source })?;

        Ok(count > 0)
    }

    async fn replace_quiz_content(&self, id: i64, content: QuizContentEntity) -> MongoResult<bool> {
        let fields = mongodb::bson::serialize_to_document(&MongoQuizContent::from(&content)).map_err(
            |err| MongoDaoError::EncodeQuiz {
                id,
                message: err.to_string(),
            },
        )?;

        // Single-document update: the three fields change together or not at all.
        let result = self
            .collection()
            .update_one(doc_id(id), doc! {"$set": fields})
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        index: "content_hash",
                        source,
                    }
                } else {
                    MongoDaoError::UpdateQuiz { id, source }
                }
            })?;

        Ok(result.matched_count > 0)
    }

    /// The quiz goes first so that `insert_score` can detect the deletion. Scores
    /// are swept even when the quiz is already gone, which lets a repeated delete
    /// finish a sweep that failed earlier.
    async fn delete_quiz(&self, id: i64) -> MongoResult<Option<u64>> {
        let removed = self
            .collection()
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteQuiz { id, source })?;

        let swept = self
            .score_collection()
            .delete_many(doc! {"game_id": id})
            .await
            .map_err(|source| MongoDaoError::DeleteScores { game_id: id, source })?;

        if removed.deleted_count == 0 {
            if swept.deleted_count > 0 {
                warn!(game_id = id, scores = swept.deleted_count, "swept scores of a deleted quiz");
            }
            return Ok(None);
        }

        Ok(Some(swept.deleted_count))
    }

    async fn find_player_by_name(&self, name: String) -> MongoResult<Option<PlayerEntity>> {
        let document = self
            .player_collection()
            .find_one(doc! {"name": &name})
            .await
            .map_err(|source| MongoDaoError::LoadPlayer { name, source })?;

        Ok(document.map(Into::into))
    }

    async fn insert_player(&self, name: String) -> MongoResult<PlayerEntity> {
        let id = self.next_id(PLAYER_COLLECTION_NAME).await?;
        let document = MongoPlayerDocument {
            id,
            name: name.clone(),
        };

        self.player_collection()
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        index: "name",
                        source,
                    }
                } else {
                    MongoDaoError::InsertPlayer { name, source }
                }
            })?;

        Ok(document.into())
    }

    async fn insert_score(&self, score: NewScoreEntity) -> MongoResult<ScoreEntity> {
        let id = self.next_id(SCORE_COLLECTION_NAME).await?;
        let score = ScoreEntity {
            id,
            player_id: score.player_id,
            game_id: score.game_id,
            value: score.value,
            played_at: DateTime::from_system_time(score.played_at).to_system_time(),
        };
        let document: MongoScoreDocument = score.clone().into();

        self.score_collection()
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertScore {
                game_id: score.game_id,
                source,
            })?;

        // A delete that removed the quiz before this check may have swept scores
        // before the insert landed; withdraw the row instead of leaving it orphaned.
        if !self.quiz_exists(score.game_id).await? {
            self.score_collection()
                .delete_one(doc_id(score.id))
                .await
                .map_err(|source| MongoDaoError::InsertScore {
                    game_id: score.game_id,
                    source,
                })?;
            return Err(MongoDaoError::MissingQuiz {
                game_id: score.game_id,
            });
        }

        Ok(score)
    }

    async fn leaderboard(&self, limit: usize) -> MongoResult<Vec<LeaderboardRowEntity>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<MongoLeaderboardRow> = self
            .score_collection()
            .aggregate(leaderboard_pipeline(limit, PLAYER_COLLECTION_NAME))
            .with_type::<MongoLeaderboardRow>()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl QuizStore for MongoQuizStore {
    fn insert_quiz(
        &self,
        content: QuizContentEntity,
        created_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<QuizEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_quiz(content, created_at)
                .await
                .map_err(Into::into)
        })
    }

    fn find_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_quiz(id).await.map_err(Into::into) })
    }

    fn find_quiz_by_hash(
        &self,
        content_hash: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_quiz_by_hash(content_hash)
                .await
                .map_err(Into::into)
        })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_quizzes().await.map_err(Into::into) })
    }

    fn random_quiz(&self) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.random_quiz().await.map_err(Into::into) })
    }

    fn quiz_exists(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.quiz_exists(id).await.map_err(Into::into) })
    }

    fn replace_quiz_content(
        &self,
        id: i64,
        content: QuizContentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_quiz_content(id, content)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_quiz(id).await.map_err(Into::into) })
    }

    fn find_player_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_player_by_name(name).await.map_err(Into::into) })
    }

    fn insert_player(&self, name: String) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_player(name).await.map_err(Into::into) })
    }

    fn insert_score(&self, score: NewScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_score(score).await.map_err(Into::into) })
    }

    fn leaderboard(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.leaderboard(limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}

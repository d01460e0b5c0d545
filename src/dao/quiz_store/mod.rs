//! Quiz persistence: the [`QuizStore`] trait and its backends.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use crate::dao::models::{
    LeaderboardRowEntity, NewScoreEntity, PlayerEntity, QuizContentEntity, QuizEntity,
    QuizListItemEntity, ScoreEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use memory::MemoryQuizStore;

/// Abstraction over the persistence layer for quizzes, players and scores.
///
/// Backends enforce two unique constraints: the quiz content hash and the player
/// name. Writes violating them fail with [`StorageError::DuplicateKey`]. A score
/// pointing at a quiz that does not exist is rejected with
/// [`StorageError::MissingReference`] and leaves nothing behind.
///
/// [`StorageError::DuplicateKey`]: crate::dao::storage::StorageError::DuplicateKey
/// [`StorageError::MissingReference`]: crate::dao::storage::StorageError::MissingReference
pub trait QuizStore: Send + Sync {
    /// Insert a new quiz and return the stored record.
    fn insert_quiz(
        &self,
        content: QuizContentEntity,
        created_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<QuizEntity>>;
    /// Load a quiz by id.
    fn find_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Load the quiz whose canonical content hashes to `content_hash`.
    fn find_quiz_by_hash(
        &self,
        content_hash: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Every quiz id with its creation time, ordered by id.
    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizListItemEntity>>>;
    /// One quiz picked uniformly at random, `None` when the store is empty.
    fn random_quiz(&self) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Whether a quiz with this id is stored.
    fn quiz_exists(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;
    /// Replace questions, bonus question and hash in one write. Returns `false`
    /// when no quiz has this id.
    fn replace_quiz_content(
        &self,
        id: i64,
        content: QuizContentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a quiz and every score recorded on it. Returns the number of scores
    /// removed, or `None` when no quiz has this id.
    fn delete_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<u64>>>;
    /// Load a player by exact (case-sensitive) name.
    fn find_player_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Register a new player.
    fn insert_player(&self, name: String) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// Record a score. Fails with `MissingReference` when the quiz is gone.
    fn insert_score(&self, score: NewScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>>;
    /// Best score per player, highest first, at most `limit` rows.
    fn leaderboard(&self, limit: usize)
    -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>>;
    /// Cheap round trip used by the health endpoint.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

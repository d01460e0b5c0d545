//! In-process [`QuizStore`] backed by a single lock over all tables.
//!
//! Every operation takes the lock once, so each call is atomic the same way a
//! single database transaction would be.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use rand::seq::IteratorRandom;
use tokio::sync::RwLock;

use super::QuizStore;
use crate::dao::{
    models::{
        LeaderboardRowEntity, NewScoreEntity, PlayerEntity, QuizContentEntity, QuizEntity,
        QuizListItemEntity, ScoreEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Memory-backed store used by tests and by `STORE_BACKEND=memory`.
#[derive(Clone, Default)]
pub struct MemoryQuizStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    quizzes: BTreeMap<i64, QuizEntity>,
    quiz_by_hash: HashMap<String, i64>,
    players: BTreeMap<i64, PlayerEntity>,
    player_by_name: HashMap<String, i64>,
    scores: BTreeMap<i64, ScoreEntity>,
    last_quiz_id: i64,
    last_player_id: i64,
    last_score_id: i64,
}

impl MemoryQuizStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scores currently recorded on `game_id`.
    pub async fn score_count(&self, game_id: i64) -> usize {
        self.tables
            .read()
            .await
            .scores
            .values()
            .filter(|score| score.game_id == game_id)
            .count()
    }
}

impl Tables {
    fn insert_quiz(
        &mut self,
        content: QuizContentEntity,
        created_at: SystemTime,
    ) -> StorageResult<QuizEntity> {
        if self.quiz_by_hash.contains_key(&content.content_hash) {
            return Err(StorageError::DuplicateKey {
                key: "content_hash",
            });
        }

        self.last_quiz_id += 1;
        let quiz = QuizEntity {
            id: self.last_quiz_id,
            content,
            created_at,
        };
        self.quiz_by_hash
            .insert(quiz.content.content_hash.clone(), quiz.id);
        self.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    fn replace_content(&mut self, id: i64, content: QuizContentEntity) -> StorageResult<bool> {
        let Some(quiz) = self.quizzes.get_mut(&id) else {
            return Ok(false);
        };

        match self.quiz_by_hash.get(&content.content_hash) {
            Some(owner) if *owner != id => {
                return Err(StorageError::DuplicateKey {
                    key: "content_hash",
                });
            }
            _ => {}
        }

        self.quiz_by_hash.remove(&quiz.content.content_hash);
        self.quiz_by_hash.insert(content.content_hash.clone(), id);
        quiz.content = content;
        Ok(true)
    }

    fn delete_quiz(&mut self, id: i64) -> Option<u64> {
        let quiz = self.quizzes.remove(&id)?;
        self.quiz_by_hash.remove(&quiz.content.content_hash);
        let before = self.scores.len();
        self.scores.retain(|_, score| score.game_id != id);
        Some((before - self.scores.len()) as u64)
    }

    fn insert_player(&mut self, name: String) -> StorageResult<PlayerEntity> {
        if self.player_by_name.contains_key(&name) {
            return Err(StorageError::DuplicateKey { key: "name" });
        }

        self.last_player_id += 1;
        let player = PlayerEntity {
            id: self.last_player_id,
            name,
        };
        self.player_by_name.insert(player.name.clone(), player.id);
        self.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn insert_score(&mut self, score: NewScoreEntity) -> StorageResult<ScoreEntity> {
        if !self.quizzes.contains_key(&score.game_id) {
            return Err(StorageError::MissingReference { key: "game_id" });
        }
        if !self.players.contains_key(&score.player_id) {
            return Err(StorageError::MissingReference { key: "player_id" });
        }

        self.last_score_id += 1;
        let score = ScoreEntity {
            id: self.last_score_id,
            player_id: score.player_id,
            game_id: score.game_id,
            value: score.value,
            played_at: score.played_at,
        };
        self.scores.insert(score.id, score.clone());
        Ok(score)
    }

    fn leaderboard(&self, limit: usize) -> Vec<LeaderboardRowEntity> {
        // Scores iterate by id, so the earliest row wins among equal values.
        let mut best: BTreeMap<i64, &ScoreEntity> = BTreeMap::new();
        for score in self.scores.values() {
            best.entry(score.player_id)
                .and_modify(|current| {
                    if score.value > current.value {
                        *current = score;
                    }
                })
                .or_insert(score);
        }

        let mut rows: Vec<LeaderboardRowEntity> = best
            .into_iter()
            .filter_map(|(player_id, score)| {
                self.players
                    .get(&player_id)
                    .map(|player| LeaderboardRowEntity {
                        player_id,
                        player: player.name.clone(),
                        best: score.value,
                        game_id: score.game_id,
                        played_at: score.played_at,
                    })
            })
            .collect();

        rows.sort_by(|left, right| {
            right
                .best
                .cmp(&left.best)
                .then(left.player_id.cmp(&right.player_id))
        });
        rows.truncate(limit);
        rows
    }
}

impl QuizStore for MemoryQuizStore {
    fn insert_quiz(
        &self,
        content: QuizContentEntity,
        created_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<QuizEntity>> {
        let tables = self.tables.clone();
        Box::pin(async move { tables.write().await.insert_quiz(content, created_at) })
    }

    fn find_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.read().await.quizzes.get(&id).cloned()) })
    }

    fn find_quiz_by_hash(
        &self,
        content_hash: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard
                .quiz_by_hash
                .get(&content_hash)
                .and_then(|id| guard.quizzes.get(id))
                .cloned())
        })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizListItemEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard.quizzes.values().cloned().map(Into::into).collect())
        })
    }

    fn random_quiz(&self) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard.quizzes.values().choose(&mut rand::rng()).cloned())
        })
    }

    fn quiz_exists(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.read().await.quizzes.contains_key(&id)) })
    }

    fn replace_quiz_content(
        &self,
        id: i64,
        content: QuizContentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move { tables.write().await.replace_content(id, content) })
    }

    fn delete_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.write().await.delete_quiz(id)) })
    }

    fn find_player_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard
                .player_by_name
                .get(&name)
                .and_then(|id| guard.players.get(id))
                .cloned())
        })
    }

    fn insert_player(&self, name: String) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let tables = self.tables.clone();
        Box::pin(async move { tables.write().await.insert_player(name) })
    }

    fn insert_score(&self, score: NewScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let tables = self.tables.clone();
        Box::pin(async move { tables.write().await.insert_score(score) })
    }

    fn leaderboard(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.read().await.leaderboard(limit)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(hash: &str) -> QuizContentEntity {
        QuizContentEntity {
            questions: Vec::new(),
            bonus_question: None,
            content_hash: hash.into(),
        }
    }

    async fn score(store: &MemoryQuizStore, player_id: i64, game_id: i64, value: i64) {
        store
            .insert_score(NewScoreEntity {
                player_id,
                game_id,
                value,
                played_at: SystemTime::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn content_hash_is_unique() {
        let store = MemoryQuizStore::new();
        store
            .insert_quiz(content("abc"), SystemTime::now())
            .await
            .unwrap();

        let err = store
            .insert_quiz(content("abc"), SystemTime::now())
            .await
            .unwrap_err();

        assert!(err.is_duplicate_key());
        assert_eq!(store.list_quizzes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_moves_hash_index() {
        let store = MemoryQuizStore::new();
        let quiz = store
            .insert_quiz(content("old"), SystemTime::now())
            .await
            .unwrap();

        assert!(
            store
                .replace_quiz_content(quiz.id, content("new"))
                .await
                .unwrap()
        );

        assert!(
            store
                .find_quiz_by_hash("old".into())
                .await
                .unwrap()
                .is_none()
        );
        let found = store.find_quiz_by_hash("new".into()).await.unwrap().unwrap();
        assert_eq!(found.id, quiz.id);
    }

    #[tokio::test]
    async fn replace_rejects_hash_owned_by_other_quiz() {
        let store = MemoryQuizStore::new();
        let first = store
            .insert_quiz(content("one"), SystemTime::now())
            .await
            .unwrap();
        store
            .insert_quiz(content("two"), SystemTime::now())
            .await
            .unwrap();

        let err = store
            .replace_quiz_content(first.id, content("two"))
            .await
            .unwrap_err();

        assert!(err.is_duplicate_key());
        let unchanged = store.find_quiz(first.id).await.unwrap().unwrap();
        assert_eq!(unchanged.content.content_hash, "one");
    }

    #[tokio::test]
    async fn replace_unknown_quiz_reports_missing() {
        let store = MemoryQuizStore::new();
        assert!(!store.replace_quiz_content(42, content("x")).await.unwrap());
    }

    #[tokio::test]
    async fn delete_cascades_scores() {
        let store = MemoryQuizStore::new();
        let kept = store
            .insert_quiz(content("kept"), SystemTime::now())
            .await
            .unwrap();
        let doomed = store
            .insert_quiz(content("doomed"), SystemTime::now())
            .await
            .unwrap();
        let player = store.insert_player("ann".into()).await.unwrap();
        score(&store, player.id, kept.id, 10).await;
        score(&store, player.id, doomed.id, 20).await;

        assert_eq!(store.delete_quiz(doomed.id).await.unwrap(), Some(1));

        assert_eq!(store.score_count(doomed.id).await, 0);
        assert_eq!(store.score_count(kept.id).await, 1);
        assert!(!store.quiz_exists(doomed.id).await.unwrap());
        assert_eq!(store.delete_quiz(doomed.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn score_on_missing_quiz_is_rejected() {
        let store = MemoryQuizStore::new();
        let quiz = store
            .insert_quiz(content("gone"), SystemTime::now())
            .await
            .unwrap();
        let player = store.insert_player("late".into()).await.unwrap();
        store.delete_quiz(quiz.id).await.unwrap();

        let err = store
            .insert_score(NewScoreEntity {
                player_id: player.id,
                game_id: quiz.id,
                value: 5,
                played_at: SystemTime::now(),
            })
            .await
            .unwrap_err();

        assert!(err.is_missing_reference());
        assert_eq!(store.score_count(quiz.id).await, 0);
        assert!(store.leaderboard(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn player_name_is_unique_and_case_sensitive() {
        let store = MemoryQuizStore::new();
        store.insert_player("Bob".into()).await.unwrap();

        assert!(store.insert_player("bob".into()).await.is_ok());
        assert!(
            store
                .insert_player("Bob".into())
                .await
                .unwrap_err()
                .is_duplicate_key()
        );
    }

    #[tokio::test]
    async fn leaderboard_keeps_best_row_per_player() {
        let store = MemoryQuizStore::new();
        let first = store
            .insert_quiz(content("a"), SystemTime::now())
            .await
            .unwrap();
        let second = store
            .insert_quiz(content("b"), SystemTime::now())
            .await
            .unwrap();
        let p1 = store.insert_player("p1".into()).await.unwrap();
        let p2 = store.insert_player("p2".into()).await.unwrap();
        score(&store, p1.id, first.id, 1000).await;
        score(&store, p1.id, second.id, 1500).await;
        score(&store, p2.id, first.id, 700).await;

        let rows = store.leaderboard(10).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player, "p1");
        assert_eq!(rows[0].best, 1500);
        assert_eq!(rows[0].game_id, second.id);
        assert_eq!(rows[1].player, "p2");
        assert_eq!(store.leaderboard(1).await.unwrap().len(), 1);
    }
}

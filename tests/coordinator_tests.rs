mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::SystemTime,
};

use axum::http::{Method, StatusCode};
use futures::future::{BoxFuture, join_all};
use serde_json::json;
use trivia_back::{
    config::AppConfig,
    dao::{
        models::{
            LeaderboardRowEntity, NewScoreEntity, PlayerEntity, QuizContentEntity, QuizEntity,
            QuizListItemEntity, ScoreEntity,
        },
        quiz_store::{MemoryQuizStore, QuizStore},
        storage::{StorageError, StorageResult},
    },
};

use common::{
    StubProvider, TestApp, sample_payload, test_app, test_app_with_config, test_app_with_store,
};

/// Memory store that can pretend a lookup happened before a concurrent writer committed.
#[derive(Default)]
struct ScriptedStore {
    inner: MemoryQuizStore,
    hidden_hash_lookups: AtomicUsize,
    hidden_player_lookups: AtomicUsize,
    hash_lookups: AtomicUsize,
    reject_quiz_inserts: AtomicBool,
    delete_after_exists_check: AtomicBool,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl QuizStore for ScriptedStore {
    fn insert_quiz(
        &self,
        content: QuizContentEntity,
        created_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<QuizEntity>> {
        if self.reject_quiz_inserts.load(Ordering::SeqCst) {
            return Box::pin(async {
                Err(StorageError::DuplicateKey {
                    key: "content_hash",
                })
            });
        }
        self.inner.insert_quiz(content, created_at)
    }

    fn find_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        self.inner.find_quiz(id)
    }

    fn find_quiz_by_hash(
        &self,
        content_hash: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        self.hash_lookups.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.hidden_hash_lookups) {
            return Box::pin(async { Ok(None) });
        }
        self.inner.find_quiz_by_hash(content_hash)
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizListItemEntity>>> {
        self.inner.list_quizzes()
    }

    fn random_quiz(&self) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        self.inner.random_quiz()
    }

    fn quiz_exists(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        let delete_after = self.delete_after_exists_check.swap(false, Ordering::SeqCst);
        Box::pin(async move {
            let exists = inner.quiz_exists(id).await?;
            if delete_after {
                // A concurrent DELETE landing right after the check.
                inner.delete_quiz(id).await?;
            }
            Ok(exists)
        })
    }

    fn replace_quiz_content(
        &self,
        id: i64,
        content: QuizContentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.replace_quiz_content(id, content)
    }

    fn delete_quiz(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        self.inner.delete_quiz(id)
    }

    fn find_player_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        if take_one(&self.hidden_player_lookups) {
            return Box::pin(async { Ok(None) });
        }
        self.inner.find_player_by_name(name)
    }

    fn insert_player(&self, name: String) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        self.inner.insert_player(name)
    }

    fn insert_score(&self, score: NewScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        self.inner.insert_score(score)
    }

    fn leaderboard(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        self.inner.leaderboard(limit)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }
}

fn scripted_app(store: Arc<ScriptedStore>) -> TestApp {
    let memory = store.inner.clone();
    test_app_with_store(
        Arc::new(StubProvider::fixed(sample_payload("race"))),
        store,
        memory,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_creates_yield_one_game() {
    let app = Arc::new(test_app(Arc::new(StubProvider::fixed(sample_payload(
        "concurrent",
    )))));

    let handles = (0..8).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { app.create_game().await })
    });
    let ids: Vec<i64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(app.store().list_quizzes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn lost_insert_race_returns_the_stored_row() {
    let store = Arc::new(ScriptedStore::default());
    let app = scripted_app(store.clone());
    let winner = app.create_game().await;

    // The next lookup misses the row, so the insert hits the unique index.
    store.hidden_hash_lookups.store(1, Ordering::SeqCst);
    let (status, body) = app.request(Method::POST, "/games/", None, true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_id"], winner);
    assert_eq!(store.list_quizzes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unresolvable_conflict_is_500_without_retrying() {
    let store = Arc::new(ScriptedStore::default());
    store.reject_quiz_inserts.store(true, Ordering::SeqCst);
    let app = scripted_app(store.clone());

    let (status, body) = app.request(Method::POST, "/games/", None, true).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "detail": "Failed to retrieve game after conflict" })
    );
    assert_eq!(store.hash_lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_first_score_reuses_the_winning_player() {
    let store = Arc::new(ScriptedStore::default());
    let app = scripted_app(store.clone());
    let id = app.create_game().await;
    app.submit_score(id, "Racer", 10).await;

    // Lookup misses the existing player; the insert collides and the row is read back.
    store.hidden_player_lookups.store(1, Ordering::SeqCst);
    let (status, _) = app.submit_score(id, "Racer", 20).await;

    assert_eq!(status, StatusCode::CREATED);
    let board = store.leaderboard(10).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].best, 20);
}

#[tokio::test]
async fn admin_routes_are_closed_without_a_configured_key() {
    let memory = MemoryQuizStore::new();
    let app = test_app_with_config(
        Arc::new(StubProvider::fixed(sample_payload("locked"))),
        Arc::new(memory.clone()),
        memory,
        AppConfig::default(),
    );

    let (status, _) = app.request(Method::POST, "/games/", None, true).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn game_deleted_during_score_submission_leaves_no_score() {
    let store = Arc::new(ScriptedStore::default());
    let app = scripted_app(store.clone());
    let id = app.create_game().await;

    store.delete_after_exists_check.store(true, Ordering::SeqCst);
    let (status, body) = app.submit_score(id, "Ghost", 999).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Game not found" }));
    assert!(!store.quiz_exists(id).await.unwrap());
    assert_eq!(app.score_count(id).await, 0);
    let (_, board) = app.get("/leaderboard").await;
    assert_eq!(board, json!([]));
}

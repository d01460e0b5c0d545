#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use trivia_back::{
    config::AppConfig,
    dao::quiz_store::{MemoryQuizStore, QuizStore},
    provider::{ContentProvider, ProviderError, ProviderResult},
    quiz::{KNOWN_CATEGORIES, Question, QuizPayload},
    routes,
    state::{AppState, SharedState},
};

pub const ADMIN_KEY: &str = "test-admin-key";

type GenerateFn = dyn Fn(usize) -> ProviderResult<QuizPayload> + Send + Sync;
type ReviseFn = dyn Fn(QuizPayload, String) -> ProviderResult<QuizPayload> + Send + Sync;

/// Provider answering from closures, counting its calls.
pub struct StubProvider {
    generate: Box<GenerateFn>,
    revise: Box<ReviseFn>,
    pub generate_calls: AtomicUsize,
    pub instructions: Mutex<Vec<String>>,
}

impl StubProvider {
    /// Always generate `payload`; revisions fail.
    pub fn fixed(payload: QuizPayload) -> Self {
        Self::new(
            move |_| Ok(payload.clone()),
            |_, _| Err(ProviderError::Transport("no revision scripted".into())),
        )
    }

    pub fn new(
        generate: impl Fn(usize) -> ProviderResult<QuizPayload> + Send + Sync + 'static,
        revise: impl Fn(QuizPayload, String) -> ProviderResult<QuizPayload> + Send + Sync + 'static,
    ) -> Self {
        Self {
            generate: Box::new(generate),
            revise: Box::new(revise),
            generate_calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

impl ContentProvider for StubProvider {
    fn generate(&self, count: usize) -> BoxFuture<'static, ProviderResult<QuizPayload>> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let result = (self.generate)(count);
        Box::pin(async move { result })
    }

    fn revise(
        &self,
        current: QuizPayload,
        instruction: String,
    ) -> BoxFuture<'static, ProviderResult<QuizPayload>> {
        self.instructions.lock().unwrap().push(instruction.clone());
        let result = (self.revise)(current, instruction);
        Box::pin(async move { result })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    /// Tables behind the store, for assertions the HTTP surface cannot make.
    pub memory: MemoryQuizStore,
}

impl TestApp {
    pub fn store(&self) -> Arc<dyn QuizStore> {
        self.state.store()
    }

    pub async fn score_count(&self, game_id: i64) -> usize {
        self.memory.score_count(game_id).await
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        admin: bool,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if admin {
            builder = builder.header("x-admin-key", ADMIN_KEY);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, false).await
    }

    /// Create a quiz through the admin endpoint and return its id.
    pub async fn create_game(&self) -> i64 {
        let (status, body) = self.request(Method::POST, "/games/", None, true).await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body["game_id"].as_i64().unwrap()
    }

    pub async fn submit_score(&self, game_id: i64, player: &str, score: i64) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            &format!("/games/{game_id}/score"),
            Some(serde_json::json!({ "player_name": player, "score": score })),
            false,
        )
        .await
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin_key = Some(ADMIN_KEY.into());
    config
}

pub fn test_app(provider: Arc<dyn ContentProvider>) -> TestApp {
    let memory = MemoryQuizStore::new();
    test_app_with_store(provider, Arc::new(memory.clone()), memory)
}

/// `memory` must be the tables `store` ends up reading and writing.
pub fn test_app_with_store(
    provider: Arc<dyn ContentProvider>,
    store: Arc<dyn QuizStore>,
    memory: MemoryQuizStore,
) -> TestApp {
    test_app_with_config(provider, store, memory, test_config())
}

pub fn test_app_with_config(
    provider: Arc<dyn ContentProvider>,
    store: Arc<dyn QuizStore>,
    memory: MemoryQuizStore,
    config: AppConfig,
) -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let state = AppState::new(store, provider, config);
    TestApp {
        router: routes::router(state.clone()),
        state,
        memory,
    }
}

pub fn question(text: &str, difficulty: i64) -> Question {
    Question {
        text: text.into(),
        correct_answer: format!("{text} answer"),
        wrong_answers: [
            format!("{text} wrong 1"),
            format!("{text} wrong 2"),
            format!("{text} wrong 3"),
        ],
        hint: Some(format!("{text} hint")),
        difficulty,
        category: KNOWN_CATEGORIES[(difficulty as usize) % KNOWN_CATEGORIES.len()].into(),
        prize_tier: Some(format!("${}", difficulty * 100)),
    }
}

/// Fifteen questions of increasing difficulty plus a bonus question, all tagged with `seed`.
pub fn sample_payload(seed: &str) -> QuizPayload {
    QuizPayload {
        questions: (1..=15)
            .map(|difficulty| question(&format!("{seed} question {difficulty}"), difficulty))
            .collect(),
        bonus_question: Some(question(&format!("{seed} bonus"), 8)),
    }
}

use std::sync::Arc;

use crate::{config::AppConfig, dao::quiz_store::QuizStore, provider::ContentProvider};

/// State handle passed to handlers.
pub type SharedState = Arc<AppState>;

/// Handles shared by every request. Holds no mutable domain state: requests
/// coordinate only through the store's unique constraints.
pub struct AppState {
    store: Arc<dyn QuizStore>,
    provider: Arc<dyn ContentProvider>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        store: Arc<dyn QuizStore>,
        provider: Arc<dyn ContentProvider>,
        config: AppConfig,
    ) -> SharedState {
        Arc::new(Self {
            store,
            provider,
            config,
        })
    }

    /// Persistence backend.
    pub fn store(&self) -> Arc<dyn QuizStore> {
        self.store.clone()
    }

    /// Content generation backend.
    pub fn provider(&self) -> Arc<dyn ContentProvider> {
        self.provider.clone()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

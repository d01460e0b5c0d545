//! Application-level configuration loading: JSON file first, environment overrides on top.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REVISION_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
/// Upper bound accepted for the `limit` query parameter.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Which [`QuizStore`](crate::dao::quiz_store::QuizStore) implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB, available with the `mongo-store` feature.
    Mongo,
    /// Process-local tables, lost on restart.
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(Self::Mongo),
            "memory" | "in-memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Storage connection settings.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Selected backend.
    pub backend: StoreBackend,
    /// MongoDB connection string.
    pub mongo_uri: String,
    /// MongoDB database name; the backend default is used when unset.
    pub mongo_db: Option<String>,
}

/// Settings for the OpenAI-compatible content provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Bearer token. Provider calls fail when it is missing.
    pub api_key: Option<String>,
    /// API root, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model used to generate new quizzes.
    pub model: String,
    /// Model used to revise existing quizzes.
    pub revision_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Bound on a single provider request.
    pub timeout: Duration,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the HTTP server binds to.
    pub port: u16,
    /// Shared secret expected in the `X-Admin-Key` header.
    pub admin_key: Option<String>,
    /// Storage settings.
    pub store: StoreSettings,
    /// Content provider settings.
    pub provider: ProviderSettings,
    /// CORS origins; empty means permissive.
    pub allowed_origins: Vec<String>,
    /// Rows returned by the leaderboard when no `limit` is given.
    pub leaderboard_default_limit: usize,
}

impl AppConfig {
    /// Load the configuration from disk and the process environment.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        Self::from_sources(raw, |key| env::var(key).ok())
    }

    /// Merge file values with overrides returned by `lookup` (usually the environment).
    pub fn from_sources(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = lookup("PORT")
            .or_else(|| lookup("SERVER_PORT"))
            .and_then(|value| parse_or_warn::<u16>("PORT", &value))
            .or(raw.port)
            .unwrap_or(DEFAULT_PORT);

        let backend = lookup("STORE_BACKEND")
            .or(raw.store_backend)
            .and_then(|value| {
                let parsed = StoreBackend::parse(&value);
                if parsed.is_none() {
                    warn!(value = %value, "unknown store backend; using default");
                }
                parsed
            })
            .unwrap_or(if cfg!(feature = "mongo-store") {
                StoreBackend::Mongo
            } else {
                StoreBackend::Memory
            });

        let timeout_secs = lookup("PROVIDER_TIMEOUT_SECS")
            .and_then(|value| parse_or_warn::<u64>("PROVIDER_TIMEOUT_SECS", &value))
            .or(raw.provider_timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or(raw.allowed_origins);

        let leaderboard_default_limit = lookup("LEADERBOARD_DEFAULT_LIMIT")
            .and_then(|value| parse_or_warn::<usize>("LEADERBOARD_DEFAULT_LIMIT", &value))
            .or(raw.leaderboard_default_limit)
            .map(|limit| limit.clamp(1, MAX_LEADERBOARD_LIMIT))
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT);

        Self {
            port,
            admin_key: lookup("ADMIN_API_KEY").or(raw.admin_api_key),
            store: StoreSettings {
                backend,
                mongo_uri: lookup("MONGO_URI")
                    .or(raw.mongo_uri)
                    .unwrap_or_else(|| DEFAULT_MONGO_URI.into()),
                mongo_db: lookup("MONGO_DB").or(raw.mongo_db),
            },
            provider: ProviderSettings {
                api_key: lookup("OPENAI_API_KEY").or(raw.openai_api_key),
                base_url: lookup("OPENAI_BASE_URL")
                    .or(raw.openai_base_url)
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
                model: lookup("OPENAI_MODEL")
                    .or(raw.openai_model)
                    .unwrap_or_else(|| DEFAULT_MODEL.into()),
                revision_model: lookup("OPENAI_REVISION_MODEL")
                    .or(raw.openai_revision_model)
                    .unwrap_or_else(|| DEFAULT_REVISION_MODEL.into()),
                temperature: raw.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                timeout: Duration::from_secs(timeout_secs),
            },
            allowed_origins,
            leaderboard_default_limit,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_sources(RawConfig::default(), |_| None)
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    port: Option<u16>,
    admin_api_key: Option<String>,
    store_backend: Option<String>,
    mongo_uri: Option<String>,
    mongo_db: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    openai_model: Option<String>,
    openai_revision_model: Option<String>,
    temperature: Option<f32>,
    provider_timeout_secs: Option<u64>,
    allowed_origins: Vec<String>,
    leaderboard_default_limit: Option<usize>,
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse::<T>().ok();
    if parsed.is_none() {
        warn!(key, value, "ignoring malformed configuration value");
    }
    parsed
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

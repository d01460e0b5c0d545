//! Minimal OpenAI chat-completions client.
//!
//! Only `chat/completions` with `response_format = json_object` is used. Calls log
//! model names, latency and token usage, never the API key or the content.

use std::{sync::Arc, time::Instant};

use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::{ContentProvider, ProviderError, ProviderResult, prompts};
use crate::{
    config::ProviderSettings,
    quiz::{
        QuizPayload,
        schema::{SchemaError, parse_payload_str},
    },
};

const CLIENT_NAME: &str = concat!("trivia-back/", env!("CARGO_PKG_VERSION"));

/// [`ContentProvider`] backed by an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiProvider {
    inner: Arc<OpenAiInner>,
}

struct OpenAiInner {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
    /// Build the HTTP client with the configured request timeout.
    pub fn new(settings: ProviderSettings) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        Ok(Self {
            inner: Arc::new(OpenAiInner { client, settings }),
        })
    }
}

impl OpenAiInner {
    /// JSON-object chat completion returning the raw message content.
    #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
    async fn chat_json(&self, model: &str, system: String, user: String) -> ProviderResult<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured)?;

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessageReq {
                    role: "system",
                    content: system,
                },
                ChatMessageReq {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.settings.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, CLIENT_NAME)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_openai_error(&body).unwrap_or(body);
            error!(status = status.as_u16(), elapsed = ?started.elapsed(), "provider call failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        let body = decode_completion(&text)?;
        if let Some(usage) = &body.usage {
            info!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                total_tokens = ?usage.total_tokens,
                elapsed = ?started.elapsed(),
                "provider usage"
            );
        }

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

impl ContentProvider for OpenAiProvider {
    fn generate(&self, count: usize) -> BoxFuture<'static, ProviderResult<QuizPayload>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let raw = inner
                .chat_json(
                    &inner.settings.model,
                    prompts::generation_system(),
                    prompts::generation_user(count),
                )
                .await?;
            Ok(parse_payload_str(&raw)?)
        })
    }

    fn revise(
        &self,
        current: QuizPayload,
        instruction: String,
    ) -> BoxFuture<'static, ProviderResult<QuizPayload>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let raw = inner
                .chat_json(
                    &inner.settings.revision_model,
                    prompts::revision_system(),
                    prompts::revision_user(&current, &instruction),
                )
                .await?;
            Ok(parse_payload_str(&raw)?)
        })
    }
}

fn decode_completion(body: &str) -> Result<ChatCompletionResponse, SchemaError> {
    serde_json::from_str(body).map_err(SchemaError::MalformedEnvelope)
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(err.to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

/// Pull `error.message` out of an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorWrapper {
        error: ErrorObject,
    }
    #[derive(Deserialize)]
    struct ErrorObject {
        message: String,
    }

    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|wrapper| wrapper.error.message)
}

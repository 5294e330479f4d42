use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::LlmConfig;

/// Model selection for a call: cheap and fast, or expensive and thorough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRoute {
    Fast,
    Deep,
}

/// JSON schema handed to schema-constrained generation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Remote completion service. Injected into the assessors so tests can script responses.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Free-text completion.
    async fn complete(
        &self,
        route: ModelRoute,
        system: &str,
        prompt: &str,
    ) -> Result<String, LlmError>;

    /// Completion constrained to `schema`, returned as parsed JSON.
    async fn complete_structured(
        &self,
        route: ModelRoute,
        system: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> Result<Value, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion API key is not configured")]
    MissingApiKey,
    #[error("completion request timed out")]
    Timeout,
    #[error("completion transport failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion service returned no content")]
    EmptyResponse,
    #[error("completion output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<reqwest::Error> for LlmError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(value)
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    fast_model: String,
    deep_model: String,
}

impl HttpCompletionClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Transport)?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            fast_model: config.fast_model.clone(),
            deep_model: config.deep_model.clone(),
        })
    }

    pub fn model_for(&self, route: ModelRoute) -> &str {
        match route {
            ModelRoute::Fast => &self.fast_model,
            ModelRoute::Deep => &self.deep_model,
        }
    }

    async fn send(
        &self,
        route: ModelRoute,
        system: &str,
        prompt: &str,
        response_format: Option<Value>,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let model = self.model_for(route);
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
            response_format,
        };

        let started = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatResponse = response.json().await?;
        debug!(
            model,
            ?route,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        route: ModelRoute,
        system: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        self.send(route, system, prompt, None).await
    }

    async fn complete_structured(
        &self,
        route: ModelRoute,
        system: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> Result<Value, LlmError> {
        let format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": true,
            }
        });
        let content = self.send(route, system, prompt, Some(format)).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

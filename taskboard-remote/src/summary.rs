//! Text generator speaking the OpenAI-compatible chat completions API

use crate::client::extract_error_description;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use taskboard_config::SummaryConfig;
use taskboard_kanban::{ColumnCounts, KanbanError, SummaryRequest, TextGenerator};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    n: u32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

/// User message payload
#[derive(Debug, Serialize)]
struct CountsMessage<'a> {
    todos: &'a ColumnCounts,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`TextGenerator`] posting to `{endpoint}/chat/completions`
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsClient {
    pub fn new(config: &SummaryConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn body(&self, request: &SummaryRequest) -> Result<CompletionRequest<'_>, RemoteError> {
        let counts = serde_json::to_string(&CountsMessage {
            todos: &request.todos,
        })?;
        Ok(CompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            n: 1,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.instructions.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: counts,
                },
            ],
        })
    }

    async fn complete(&self, request: &SummaryRequest) -> Result<String, RemoteError> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("POST {} with model {}", url, self.model);

        let mut builder = self.client.post(&url).json(&self.body(request)?);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_description(&body);
            return Err(match status.as_u16() {
                401 => RemoteError::Unauthorized(message),
                403 => RemoteError::Forbidden(message),
                code => RemoteError::Api {
                    status: code,
                    body: message,
                },
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RemoteError::InvalidResponse("no choices in completion".to_string()))
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, request: &SummaryRequest) -> Result<String, KanbanError> {
        self.complete(request)
            .await
            .map_err(|e| e.into_kanban("summary"))
    }
}

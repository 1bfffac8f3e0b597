//! Chat-completion client for the external advisor backend
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::advisor::{GenerationRequest, ResponseGenerator};
use crate::config::AdvisorConfig;
use crate::error::FinanceError;
use crate::models::AdvisorIntent;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Reusable chat-completion client (connection-pooled)
pub struct ChatCompletionClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    system_prompt: String,
}

impl ChatCompletionClient {
    pub fn new(config: &AdvisorConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// Send one system + user exchange, return the completion text
    pub async fn complete(&self, user_message: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(FinanceError::BackendUnavailable(
                "AI_API_KEY not configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
            temperature: 0.7,
            max_tokens: 500,
        };

        info!(model = %self.model, "Calling chat-completion backend");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat-completion request failed: {}", e);
                FinanceError::BackendUnavailable(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Chat-completion error response: {}", error_text);
            return Err(FinanceError::BackendUnavailable(format!(
                "backend returned {}",
                status
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat-completion response: {}", e);
            FinanceError::BackendUnavailable(format!("parse error: {}", e))
        })?;

        extract_answer(body)
    }
}

/// Build the user turn from intent, sanitized context and redacted question
pub fn build_user_message(intent: AdvisorIntent, query: &str, context: &str) -> String {
    format!(
        "Topic: {}\n\nContext:\n{}\n\nQuestion:\n{}",
        intent, context, query
    )
}

fn extract_answer(body: ChatResponse) -> crate::Result<String> {
    let answer = body
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .unwrap_or_default();

    if answer.is_empty() {
        return Err(FinanceError::BackendUnavailable(
            "backend responded without content".to_string(),
        ));
    }

    Ok(answer)
}

/// External generator backed by [`ChatCompletionClient`]
pub struct ChatCompletionGenerator {
    client: ChatCompletionClient,
}

impl ChatCompletionGenerator {
    pub fn new(client: ChatCompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResponseGenerator for ChatCompletionGenerator {
    fn name(&self) -> &'static str {
        "chat_completion"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> crate::Result<String> {
        self.client
            .complete(&build_user_message(
                request.intent,
                request.query,
                request.context_summary,
            ))
            .await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

//! Completion client for OpenAI-compatible chat APIs.
//!
//! One call per `complete`; no retries. Function calling uses the
//! `functions` / `function_call` request fields.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use chatrelay_core::{Error, Result};

use crate::config::LLMConfig;
use crate::types::{Completion, FunctionCall, FunctionSpec, Message};

/// Anything that can turn a message sequence into a reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion. `functions` may be empty, in which case the
    /// model is not offered any function.
    async fn complete(&self, messages: &[Message], functions: &[FunctionSpec])
        -> Result<Completion>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

pub struct OpenAIClient {
    http: Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenAIClient {
    pub fn new(http: Client, config: &LLMConfig) -> Self {
        Self {
            http,
            url: config.chat_completions_url(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(
        &self,
        messages: &[Message],
        functions: &[FunctionSpec],
    ) -> Result<Completion> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !functions.is_empty() {
            body["functions"] = json!(functions);
            body["function_call"] = json!("auto");
        }

        debug!(
            "Requesting completion from {} with model {} ({} messages, {} functions)",
            self.url,
            self.model,
            messages.len(),
            functions.len()
        );

        let response = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream { status, body });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("Malformed response: {}", e)))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Completion("Response contained no choices".into()))?;

        if let Some(call) = message.function_call {
            debug!("Model requested function {}", call.name);
            return Ok(Completion::FunctionCall(call));
        }

        message
            .content
            .map(Completion::Text)
            .ok_or_else(|| Error::Completion("Response contained no content".into()))
    }
}

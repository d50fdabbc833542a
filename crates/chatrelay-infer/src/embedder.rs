//! Embedding trait and the OpenAI-compatible implementation.

use async_trait::async_trait;
use ndarray::Array1;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use chatrelay_chat::LLMConfig;
use chatrelay_core::{Error, Result};

/// Inputs sent per embeddings request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed many texts; output order matches input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Embedder returned no vector".into()))
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAIEmbedder {
    http: Client,
    url: String,
    model: String,
    api_key: String,
    batch_size: usize,
}

impl OpenAIEmbedder {
    pub fn new(http: Client, config: &LLMConfig) -> Self {
        Self {
            http,
            url: config.embeddings_url(),
            model: config.embedding_model.clone(),
            api_key: config.api_key.clone(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Array1<f32>>> {
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

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

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Malformed response: {}", e)))?;

        if parsed.data.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed
            .data
            .into_iter()
            .map(|d| Array1::from_vec(d.embedding))
            .collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!("Embedding batch of {} with model {}", batch.len(), self.model);
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }
}


use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::embeddings::Embedder;
use crate::generation::Generator;

/// Blocking client for an OpenAI-compatible embeddings and completions API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: Option<String>,
    embedding_model: String,
    completion_model: String,
    max_tokens: u32,
    temperature: f32,
    batch_size: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub owned_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = config
            .service_url()
            .context("Failed to generate service URL from config")?;

        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                "No API key found in ${} or the settings file; requests will be unauthenticated",
                config.api_key_env
            );
        }

        Ok(Self {
            base_url,
            api_key,
            embedding_model: config.embedding_model.clone(),
            completion_model: config.completion_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            batch_size: config.batch_size,
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check that the service answers and lists the configured models
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for {}", self.base_url);

        let models = self.list_models().context("Failed to list models")?;

        for model in [&self.embedding_model, &self.completion_model] {
            if !models.iter().any(|m| &m.id == model) {
                warn!("Model {} not listed by {}", model, self.base_url);
                return Err(anyhow::anyhow!(
                    "Model '{}' is not available at {}",
                    model,
                    self.base_url
                ));
            }
        }

        info!("Health check passed for {}", self.base_url);
        Ok(())
    }

    /// List the models the service exposes
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("models")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let mut request = self.agent.get(url.as_str());
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.call().context("Failed to reach service")?;
        let models: ModelsResponse = read_json(response).context("Failed to fetch models")?;

        debug!("Found {} models", models.data.len());
        Ok(models.data)
    }

    /// Embed texts in batches of at most `batch_size`
    #[inline]
    pub fn generate_embeddings_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1) as usize) {
            let embeddings = self
                .generate_embeddings_single_batch(batch)
                .with_context(|| format!("Failed to process batch of {} texts", batch.len()))?;
            results.extend(embeddings);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    fn generate_embeddings_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response: EmbeddingResponse = self
            .post_json("embeddings", &request)
            .context("Failed to generate embeddings")?;

        if response.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            ));
        }

        let mut data = response.data;
        data.sort_by_key(|item| item.index);

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    /// Request a single completion and return its text unchanged
    #[inline]
    pub fn generate_completion(&self, prompt: &str) -> Result<String> {
        debug!("Requesting completion (prompt length: {})", prompt.len());

        let request = CompletionRequest {
            model: &self.completion_model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response: CompletionResponse = self
            .post_json("completions", &request)
            .context("Failed to generate completion")?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Completion response contained no choices"))?;

        debug!("Received completion of {} chars", choice.text.len());
        Ok(choice.text)
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &T) -> Result<R> {
        let url = self
            .base_url
            .join(endpoint)
            .with_context(|| format!("Failed to build {} URL", endpoint))?;

        let request_json =
            serde_json::to_string(body).context("Failed to serialize request body")?;

        debug!("POST {}", url);

        let mut request = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send(&request_json)
            .with_context(|| format!("Request to {} failed", url))?;

        read_json(response)
    }
}

impl Embedder for OpenAiClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embeddings_single_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedding response was empty"))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_embeddings_batch(texts)
    }
}

impl Generator for OpenAiClient {
    #[inline]
    fn complete(&self, prompt: &str) -> Result<String> {
        self.generate_completion(prompt)
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Decode a JSON body, turning non-success statuses into errors that carry the
/// service's own message when it sends one
fn read_json<R: DeserializeOwned>(mut response: ureq::http::Response<ureq::Body>) -> Result<R> {
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .context("Failed to read response body")?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        warn!("Service returned HTTP {}: {}", status.as_u16(), message);
        return Err(anyhow::anyhow!("HTTP {}: {}", status.as_u16(), message));
    }

    serde_json::from_str(&body).context("Failed to parse response body")
}

//! HTTP-backed gateway implementations.
//!
//! Three thin clients over the external providers: the vector-search service,
//! the embedding endpoint, and the completion endpoint used for judgment
//! calls. All requests go through a shared retry policy (server and transport
//! errors only, exponential backoff) with a global per-request timeout on the
//! agent. The async trait impls run the blocking HTTP calls on the tokio
//! blocking pool.


use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::GatewayConfig;
use crate::gateway::{
    EmbeddingGateway, Judgment, JudgmentGateway, PassageHit, RerankEntry, ReviewRequest,
    SimilarityGateway,
};
use crate::{MatchError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Shared blocking HTTP transport with bounded retry.
#[derive(Debug, Clone)]
struct Transport {
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl Transport {
    fn new(timeout: Duration, retry_attempts: u32) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            retry_attempts,
        }
    }

    fn post_json(&self, url: &Url, body: &str) -> anyhow::Result<String> {
        self.with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(body)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn get(&self, url: &Url) -> anyhow::Result<String> {
        self.with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn with_retry<F>(&self, mut request_fn: F) -> anyhow::Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                return Err(anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => return Err(anyhow!("Non-retryable error: {}", error)),
                    };

                    if should_retry {
                        last_error = Some(anyhow!("Request error: {}", error));
                        if attempt < self.retry_attempts {
                            let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                            std::thread::sleep(Duration::from_millis(delay_ms));
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Request failed after retries")))
    }
}

fn gateway_err(err: anyhow::Error) -> MatchError {
    MatchError::Gateway(format!("{:#}", err))
}

/// Strips a surrounding markdown code fence from LLM output, if present.
///
/// Providers sometimes wrap JSON responses in ```json fences; everything
/// after this must parse strictly or fail into the caller's fallback path.
#[inline]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let rest = rest.find('\n').map_or("", |idx| &rest[idx + 1..]);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Vector search
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    threshold: f32,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    matches: Vec<PassageHit>,
}

/// Client for the vector-search provider's passage search endpoint.
#[derive(Debug, Clone)]
pub struct VectorSearchClient {
    base_url: Url,
    transport: Transport,
}

impl VectorSearchClient {
    #[inline]
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = config
            .search
            .url()
            .map_err(|e| MatchError::Config(e.to_string()))?;
        Ok(Self {
            base_url,
            transport: Transport::new(
                Duration::from_secs(config.timeout_secs),
                config.retry_attempts,
            ),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = Transport::new(timeout, self.transport.retry_attempts);
        self
    }

    /// Checks that the provider is reachable.
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/v1/health")
            .map_err(|e| MatchError::Config(format!("Failed to build health URL: {}", e)))?;
        self.transport.get(&url).map_err(gateway_err)?;
        Ok(())
    }

    fn search_blocking(
        &self,
        query_vector: &[f32],
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<PassageHit>> {
        let url = self
            .base_url
            .join("/v1/vectors/search")
            .map_err(|e| MatchError::Config(format!("Failed to build search URL: {}", e)))?;

        let request = SearchRequest {
            vector: query_vector,
            threshold,
            max_results,
        };
        let body = serde_json::to_string(&request)
            .context("Failed to serialize search request")
            .map_err(gateway_err)?;

        let response_text = self.transport.post_json(&url, &body).map_err(gateway_err)?;

        let response: SearchResponse = serde_json::from_str(&response_text)
            .context("Failed to parse search response")
            .map_err(gateway_err)?;

        debug!("Vector search returned {} passage hits", response.matches.len());
        Ok(response.matches)
    }
}

#[async_trait]
impl SimilarityGateway for VectorSearchClient {
    #[inline]
    async fn search(
        &self,
        query_vector: &[f32],
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<PassageHit>> {
        let client = self.clone();
        let vector = query_vector.to_vec();
        tokio::task::spawn_blocking(move || {
            client.search_blocking(&vector, threshold, max_results)
        })
        .await
        .map_err(|e| MatchError::Gateway(format!("search task failed: {}", e)))?
    }
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Client for the embedding endpoint of the LLM provider.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: Url,
    model: String,
    transport: Transport,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = config
            .llm
            .url()
            .map_err(|e| MatchError::Config(e.to_string()))?;
        Ok(Self {
            base_url,
            model: config.embedding_model.clone(),
            transport: Transport::new(
                Duration::from_secs(config.timeout_secs),
                config.retry_attempts,
            ),
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.transport.retry_attempts = attempts;
        self
    }

    fn embed_blocking(&self, text: &str) -> Result<Vec<f32>> {
        let url = self
            .base_url
            .join("/v1/embeddings")
            .map_err(|e| MatchError::Config(format!("Failed to build embeddings URL: {}", e)))?;

        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let body = serde_json::to_string(&request)
            .context("Failed to serialize embedding request")
            .map_err(gateway_err)?;

        let response_text = self.transport.post_json(&url, &body).map_err(gateway_err)?;

        let response: EmbedResponse = serde_json::from_str(&response_text)
            .context("Failed to parse embedding response")
            .map_err(gateway_err)?;

        debug!("Generated embedding with {} dimensions", response.embedding.len());
        Ok(response.embedding)
    }
}

#[async_trait]
impl EmbeddingGateway for EmbeddingClient {
    #[inline]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || client.embed_blocking(&text))
            .await
            .map_err(|e| MatchError::Gateway(format!("embedding task failed: {}", e)))?
    }
}

// ---------------------------------------------------------------------------
// Judgment (completions)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SelectionPayload {
    selected_indices: Vec<usize>,
}

/// Client for the completion endpoint, used for both reranking selections and
/// per-target eligibility reviews.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    base_url: Url,
    model: String,
    transport: Transport,
}

impl CompletionClient {
    #[inline]
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = config
            .llm
            .url()
            .map_err(|e| MatchError::Config(e.to_string()))?;
        Ok(Self {
            base_url,
            model: config.completion_model.clone(),
            transport: Transport::new(
                Duration::from_secs(config.timeout_secs),
                config.retry_attempts,
            ),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = Transport::new(timeout, self.transport.retry_attempts);
        self
    }

    /// Checks that the provider is reachable.
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/v1/health")
            .map_err(|e| MatchError::Config(format!("Failed to build health URL: {}", e)))?;
        self.transport.get(&url).map_err(gateway_err)?;
        Ok(())
    }

    fn complete_blocking(&self, prompt: &str) -> Result<String> {
        let url = self
            .base_url
            .join("/v1/completions")
            .map_err(|e| MatchError::Config(format!("Failed to build completions URL: {}", e)))?;

        let request = CompletionRequest {
            model: &self.model,
            prompt,
        };
        let body = serde_json::to_string(&request)
            .context("Failed to serialize completion request")
            .map_err(gateway_err)?;

        let response_text = self.transport.post_json(&url, &body).map_err(gateway_err)?;

        let response: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse completion response")
            .map_err(gateway_err)?;

        Ok(response.text)
    }

    fn render_selection_prompt(
        subject_summary: &str,
        entries: &[RerankEntry],
        rubric: &str,
        count: usize,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(rubric);
        prompt.push_str("\n\nCandidate profile:\n");
        prompt.push_str(subject_summary);
        prompt.push_str("\n\nArticles:\n");
        for (i, entry) in entries.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {} by {} ({}) [similarity {:.2}]\n   {}\n",
                i + 1,
                entry.title,
                entry.author.as_deref().unwrap_or("unknown author"),
                entry
                    .published_at
                    .map_or_else(|| "undated".to_string(), |d| d.format("%Y-%m-%d").to_string()),
                entry.score,
                entry.excerpt,
            ));
        }
        prompt.push_str(&format!(
            "\nSelect exactly {} entries by number. Respond with JSON: {{\"selected_indices\": [..]}}\n",
            count
        ));
        prompt
    }

    fn render_review_prompt(subject_summary: &str, target: &ReviewRequest, rubric: &str) -> String {
        format!(
            "{}\n\nCandidate profile:\n{}\n\nOpening: {}\nRequirements:\n{}\n\nRespond with JSON: \
             {{\"accept\": bool, \"confidence\": \"low|medium|high\", \"score\": 0-100, \"reasoning\": \"...\"}}\n",
            rubric, subject_summary, target.headline, target.requirements
        )
    }
}

#[async_trait]
impl JudgmentGateway for CompletionClient {
    #[inline]
    async fn select_indices(
        &self,
        subject_summary: &str,
        entries: &[RerankEntry],
        rubric: &str,
        count: usize,
    ) -> Result<Vec<usize>> {
        let prompt = Self::render_selection_prompt(subject_summary, entries, rubric, count);
        let client = self.clone();
        let text = tokio::task::spawn_blocking(move || client.complete_blocking(&prompt))
            .await
            .map_err(|e| MatchError::Gateway(format!("completion task failed: {}", e)))??;

        let payload: SelectionPayload = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| MatchError::Gateway(format!("Unparsable selection response: {}", e)))?;
        Ok(payload.selected_indices)
    }

    #[inline]
    async fn judge(
        &self,
        subject_summary: &str,
        target: &ReviewRequest,
        rubric: &str,
    ) -> Result<Judgment> {
        let prompt = Self::render_review_prompt(subject_summary, target, rubric);
        let client = self.clone();
        let text = tokio::task::spawn_blocking(move || client.complete_blocking(&prompt))
            .await
            .map_err(|e| MatchError::Gateway(format!("completion task failed: {}", e)))??;

        let judgment: Judgment = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| MatchError::Gateway(format!("Unparsable judgment response: {}", e)))?;

        if judgment.score > 100 {
            return Err(MatchError::Gateway(format!(
                "Judgment score out of range: {}",
                judgment.score
            )));
        }

        Ok(judgment)
    }
}

//! Abstract gateways to the external similarity, embedding, and judgment
//! providers.
//!
//! The pipeline never talks to a provider directly: components take these
//! traits as constructor arguments so tests can substitute in-process fakes.
//! Both providers are assumed unreliable; callers wrap every invocation in
//! [`with_deadline`] and handle failure through their own fallback policy.

pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::{MatchError, Result};

/// A passage-level similarity hit returned by the vector-search provider.
///
/// Carries enough of the parent document's metadata to resolve the hit back
/// to the document without a second lookup. The provider returns hits sorted
/// descending by score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageHit {
    pub document_id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub featured_image: Option<String>,
    /// The matching passage's text.
    pub content: String,
    /// Similarity score in [0, 1].
    pub score: f32,
}

/// Confidence label attached to an eligibility judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// The judgment provider's decision for one (profile, target) pair.
///
/// Ephemeral: never persisted on its own, only attached to a confirmed match
/// for downstream presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub accept: bool,
    pub confidence: Confidence,
    /// 0..=100.
    pub score: u8,
    pub reasoning: String,
}

/// One pool entry presented to the judgment provider during reranking.
#[derive(Debug, Clone, Serialize)]
pub struct RerankEntry {
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<NaiveDate>,
    pub score: f32,
    pub excerpt: String,
}

/// A single eligibility-review submission for the judgment provider.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    pub target_id: String,
    /// e.g. "Senior Platform Engineer at Kong".
    pub headline: String,
    /// Rendered requirements and seniority expectations.
    pub requirements: String,
}

/// Vector-search provider: nearest neighbors above a threshold.
#[async_trait]
pub trait SimilarityGateway: Send + Sync {
    /// Returns passage hits with `score >= threshold`, sorted descending by
    /// score, at most `max_results` of them. An empty result is a valid
    /// outcome, not an error.
    async fn search(
        &self,
        query_vector: &[f32],
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<PassageHit>>;
}

/// Text-embedding provider. Deterministic for identical input text.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// LLM-backed qualitative judgment provider.
#[async_trait]
pub trait JudgmentGateway: Send + Sync {
    /// Given a 1-indexed candidate list and a subject summary, returns the
    /// indices of the `count` entries the provider judges most relevant, in
    /// relevance order. Raw provider output; callers validate the indices.
    async fn select_indices(
        &self,
        subject_summary: &str,
        entries: &[RerankEntry],
        rubric: &str,
        count: usize,
    ) -> Result<Vec<usize>>;

    /// Reviews a single (profile, target) pair against the rubric.
    async fn judge(
        &self,
        subject_summary: &str,
        target: &ReviewRequest,
        rubric: &str,
    ) -> Result<Judgment>;
}

/// Runs a gateway call under a caller-supplied deadline.
///
/// A timeout is handled identically to a gateway error downstream; nothing
/// in the pipeline blocks indefinitely on a provider.
#[inline]
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(MatchError::GatewayTimeout(format!(
            "{} exceeded {:?}",
            operation, deadline
        ))),
    }
}

//! Two-stage eligibility matching of a candidate against job postings.
//!
//! Stage 1 gates the active postings on cosine similarity between the
//! candidate's primary vector and each posting's embedding. Stage 2 walks the
//! surviving postings one at a time through an LLM eligibility review and
//! keeps only explicit accepts.


use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::gateway::{EmbeddingGateway, Judgment, JudgmentGateway, ReviewRequest, with_deadline};
use crate::profile::CandidateProfile;
use crate::similarity::cosine_similarity;
use crate::{MatchError, Result};

const REVIEW_RUBRIC: &str = "You are screening a job candidate against one specific opening. \
Accept only if the candidate plausibly meets the stated requirements; when in doubt, reject.";

/// Lifecycle state of a job posting. Only `Active` postings are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Inactive,
    Filled,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub position: String,
    pub company: String,
    #[serde(default)]
    pub required_competencies: Vec<String>,
    #[serde(default)]
    pub optional_competencies: Vec<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    pub status: JobStatus,
    /// Free-text description used for embedding and the eligibility review.
    pub description: String,
    /// Precomputed embedding; when absent the matcher embeds `description`.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl JobPosting {
    fn review_request(&self) -> ReviewRequest {
        let mut requirements = String::new();
        if !self.required_competencies.is_empty() {
            requirements.push_str("Required: ");
            requirements.push_str(&self.required_competencies.join(", "));
            requirements.push('\n');
        }
        if !self.optional_competencies.is_empty() {
            requirements.push_str("Nice to have: ");
            requirements.push_str(&self.optional_competencies.join(", "));
            requirements.push('\n');
        }
        if let Some(seniority) = &self.seniority {
            requirements.push_str("Seniority: ");
            requirements.push_str(seniority);
            requirements.push('\n');
        }
        requirements.push_str(&self.description);

        ReviewRequest {
            target_id: self.id.clone(),
            headline: format!("{} at {}", self.position, self.company),
            requirements,
        }
    }
}

/// An eligibility-confirmed posting with the evidence that confirmed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedMatch {
    pub posting: JobPosting,
    pub similarity: f32,
    pub judgment: Judgment,
}

#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Minimum cosine similarity for a posting to reach review.
    pub similarity_threshold: f32,
    /// How many Stage 1 survivors get an LLM review.
    pub review_cap: usize,
    /// Maximum confirmed matches returned.
    pub final_cap: usize,
}

/// Cooperative cancellation shared between the matcher and its caller.
///
/// Checked between reviews; postings already reviewed keep their outcome.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct EligibilityMatcher {
    embeddings: Arc<dyn EmbeddingGateway>,
    judgments: Arc<dyn JudgmentGateway>,
    stage1_concurrency: usize,
    timeout: Duration,
}

impl EligibilityMatcher {
    #[inline]
    pub fn new(
        embeddings: Arc<dyn EmbeddingGateway>,
        judgments: Arc<dyn JudgmentGateway>,
        stage1_concurrency: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            embeddings,
            judgments,
            stage1_concurrency,
            timeout,
        }
    }

    /// Runs both stages and returns confirmed matches sorted descending by
    /// similarity, truncated to `opts.final_cap`.
    ///
    /// A posting whose embedding cannot be fetched is skipped with a warning;
    /// a dimension mismatch against the candidate vector aborts the whole
    /// invocation.
    pub async fn match_eligible(
        &self,
        profile: &CandidateProfile,
        targets: &[JobPosting],
        opts: &MatchOptions,
        cancel: &CancelFlag,
    ) -> Result<Vec<ConfirmedMatch>> {
        if !(0.0..=1.0).contains(&opts.similarity_threshold) {
            return Err(MatchError::InvalidParameter(format!(
                "similarity threshold must be in [0, 1], got {}",
                opts.similarity_threshold
            )));
        }
        if opts.review_cap == 0 || opts.final_cap == 0 {
            return Err(MatchError::InvalidParameter(
                "review and final caps must be at least 1".to_string(),
            ));
        }

        let candidate_vector = profile.primary_vector()?.to_vec();

        let mut survivors = self
            .gate_by_similarity(&candidate_vector, targets, opts.similarity_threshold)
            .await?;
        survivors.sort_by(|a, b| b.1.total_cmp(&a.1));
        survivors.truncate(opts.review_cap);

        info!(
            candidate = %profile.candidate_id,
            survivors = survivors.len(),
            "similarity gate complete"
        );

        let mut confirmed = self.review(profile, survivors, cancel).await;
        confirmed.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        confirmed.truncate(opts.final_cap);
        Ok(confirmed)
    }

    /// Stage 1: concurrent embedding + cosine gate over active postings.
    async fn gate_by_similarity(
        &self,
        candidate_vector: &[f32],
        targets: &[JobPosting],
        threshold: f32,
    ) -> Result<Vec<(JobPosting, f32)>> {
        let scored = stream::iter(
            targets
                .iter()
                .filter(|t| t.status == JobStatus::Active)
                .cloned()
                .enumerate(),
        )
        .map(|(index, posting)| {
            let embeddings = Arc::clone(&self.embeddings);
            let timeout = self.timeout;
            async move {
                let embedding = match posting.embedding.clone() {
                    Some(precomputed) => Ok(precomputed),
                    None => {
                        with_deadline(timeout, "posting embedding", embeddings.embed(&posting.description))
                            .await
                    }
                };
                (index, posting, embedding)
            }
        })
        .buffer_unordered(self.stage1_concurrency)
        .collect::<Vec<_>>()
        .await;

        let mut survivors = Vec::new();
        for (index, posting, embedding) in scored {
            let embedding = match embedding {
                Ok(embedding) => embedding,
                Err(error) => {
                    warn!(
                        posting = %posting.id,
                        index,
                        "skipping posting, embedding failed: {}",
                        error
                    );
                    continue;
                }
            };
            let similarity = cosine_similarity(candidate_vector, &embedding)?;
            debug!(posting = %posting.id, similarity, "scored posting");
            if similarity >= threshold {
                survivors.push((posting, similarity));
            }
        }
        Ok(survivors)
    }

    /// Stage 2: sequential LLM review; only explicit accepts survive.
    async fn review(
        &self,
        profile: &CandidateProfile,
        survivors: Vec<(JobPosting, f32)>,
        cancel: &CancelFlag,
    ) -> Vec<ConfirmedMatch> {
        let subject = profile.summary_context();
        let mut confirmed = Vec::new();

        for (posting, similarity) in survivors {
            if cancel.is_cancelled() {
                info!("cancellation requested, stopping reviews");
                break;
            }

            let request = posting.review_request();
            let outcome = with_deadline(
                self.timeout,
                "eligibility review",
                self.judgments.judge(&subject, &request, REVIEW_RUBRIC),
            )
            .await;

            match outcome {
                Ok(judgment) if judgment.accept => {
                    debug!(posting = %posting.id, score = judgment.score, "review accepted");
                    confirmed.push(ConfirmedMatch {
                        posting,
                        similarity,
                        judgment,
                    });
                }
                Ok(judgment) => {
                    debug!(posting = %posting.id, score = judgment.score, "review rejected");
                }
                Err(error) => {
                    warn!(posting = %posting.id, "review failed, treating as rejection: {}", error);
                }
            }
        }

        confirmed
    }
}

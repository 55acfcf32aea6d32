//! Content recommendation for a candidate: wide retrieval, then either the
//! diversity filter or the hybrid reranker, formatted for the downstream
//! email/API consumer.


use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MatchingConfig;
use crate::profile::{CandidateProfile, ProfileField, ProfileVector};
use crate::ranking::{HybridReranker, truncate_chars};
use crate::Result;
use crate::retrieval::{DocumentMatch, DocumentRetriever, diversity::filter_diverse};

/// Excerpt length in the formatted output.
const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<NaiveDate>,
    /// Similarity as a percentage, rounded to one decimal.
    pub relevance_percent: f32,
    pub excerpt: String,
}

impl From<DocumentMatch> for Recommendation {
    #[inline]
    fn from(m: DocumentMatch) -> Self {
        Self {
            title: m.title,
            url: m.url,
            author: m.author,
            published_at: m.published_at,
            relevance_percent: (m.score * 1000.0).round() / 10.0,
            excerpt: truncate_chars(&m.passage, EXCERPT_CHARS),
        }
    }
}

/// Per-candidate recommendation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub candidate_id: String,
    pub full_name: String,
    pub articles: Vec<Recommendation>,
}

pub struct Recommender {
    retriever: DocumentRetriever,
    reranker: HybridReranker,
    config: MatchingConfig,
}

impl Recommender {
    #[inline]
    pub fn new(
        retriever: DocumentRetriever,
        reranker: HybridReranker,
        config: MatchingConfig,
    ) -> Self {
        Self {
            retriever,
            reranker,
            config,
        }
    }

    /// Recommends articles using the diversity filter over the retrieval pool.
    pub async fn recommend(&self, profile: &CandidateProfile) -> Result<RecommendationSet> {
        let pool = self.retrieve_pool(profile).await?;
        let picks = filter_diverse(
            &pool,
            self.config.final_count,
            &self.config.excluded_title_markers,
        );
        Ok(self.format(profile, picks))
    }

    /// Recommends articles using the LLM reranker over the retrieval pool.
    pub async fn recommend_reranked(&self, profile: &CandidateProfile) -> Result<RecommendationSet> {
        let pool = self.retrieve_pool(profile).await?;
        let picks = self
            .reranker
            .rerank(profile, pool, self.config.final_count)
            .await;
        Ok(self.format(profile, picks))
    }

    async fn retrieve_pool(&self, profile: &CandidateProfile) -> Result<Vec<DocumentMatch>> {
        let query = ProfileVector {
            field: ProfileField::ProfessionalSummary,
            embedding: profile.primary_vector()?.to_vec(),
        };
        let pool = self
            .retriever
            .retrieve(
                &query,
                self.config.retrieval_threshold,
                self.config.retrieval_pool_size,
            )
            .await?;
        info!(
            candidate = %profile.candidate_id,
            pool = pool.len(),
            "retrieved recommendation pool"
        );
        Ok(pool)
    }

    fn format(&self, profile: &CandidateProfile, picks: Vec<DocumentMatch>) -> RecommendationSet {
        RecommendationSet {
            candidate_id: profile.candidate_id.clone(),
            full_name: profile.full_name.clone(),
            articles: picks.into_iter().map(Recommendation::from).collect(),
        }
    }
}

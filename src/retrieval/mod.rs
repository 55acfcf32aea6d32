//! Passage retrieval collapsed to document-level matches.
//!
//! The similarity provider indexes passages, so a single document can appear
//! several times in one search. The retriever keeps the best-scoring passage
//! per document and returns one [`DocumentMatch`] per parent document.

pub mod diversity;


use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::gateway::{PassageHit, SimilarityGateway, with_deadline};
use crate::profile::ProfileVector;
use crate::{MatchError, Result};

/// One source document with its best-matching passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatch {
    pub document_id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<NaiveDate>,
    pub featured_image: Option<String>,
    /// Text of the highest-scoring passage for this document.
    pub passage: String,
    /// Similarity score of that passage, in [0, 1].
    pub score: f32,
}

impl From<PassageHit> for DocumentMatch {
    #[inline]
    fn from(hit: PassageHit) -> Self {
        Self {
            document_id: hit.document_id,
            title: hit.title,
            url: hit.url,
            author: hit.author,
            published_at: hit.published_at,
            featured_image: hit.featured_image,
            passage: hit.content,
            score: hit.score,
        }
    }
}

/// Searches the similarity provider and deduplicates passage hits into
/// document-level matches.
pub struct DocumentRetriever {
    gateway: Arc<dyn SimilarityGateway>,
    timeout: Duration,
}

impl DocumentRetriever {
    #[inline]
    pub fn new(gateway: Arc<dyn SimilarityGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Retrieves up to `cap` documents whose best passage scores at least
    /// `threshold` against the query vector.
    ///
    /// An empty provider response is a valid empty result, not an error.
    pub async fn retrieve(
        &self,
        query: &ProfileVector,
        threshold: f32,
        cap: usize,
    ) -> Result<Vec<DocumentMatch>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MatchError::InvalidParameter(format!(
                "threshold must be in [0, 1], got {}",
                threshold
            )));
        }
        if cap == 0 {
            return Err(MatchError::InvalidParameter(
                "result cap must be at least 1".to_string(),
            ));
        }

        // Over-fetch at the passage level so deduplication does not starve
        // the document-level cap.
        let hits = with_deadline(
            self.timeout,
            "similarity search",
            self.gateway.search(&query.embedding, threshold, cap * 2),
        )
        .await?;

        debug!(
            field = %query.field,
            hits = hits.len(),
            "similarity search complete"
        );

        Ok(deduplicate(hits, cap))
    }
}

/// Keeps the best passage per document, sorted descending by score.
fn deduplicate(hits: Vec<PassageHit>, cap: usize) -> Vec<DocumentMatch> {
    let mut best: HashMap<String, PassageHit> = HashMap::new();
    for hit in hits {
        match best.entry(hit.document_id.clone()) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                if hit.score > slot.get().score {
                    slot.insert(hit);
                }
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(hit);
            }
        }
    }

    let mut matches: Vec<DocumentMatch> = best.into_values().map(DocumentMatch::from).collect();
    // Ties break on document id so output order is stable across runs.
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    matches.truncate(cap);
    matches
}

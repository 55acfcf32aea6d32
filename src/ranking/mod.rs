//! LLM-assisted reranking of a similarity-ordered candidate pool.

#[cfg(test)]
mod tests;

use itertools::Itertools;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::gateway::{JudgmentGateway, RerankEntry};
use crate::profile::CandidateProfile;
use crate::retrieval::DocumentMatch;

const SELECTION_RUBRIC: &str = "You are helping match a job candidate with blog articles they \
would find genuinely interesting. Prefer substantive technical depth and topical overlap with \
the candidate's background over superficial keyword matches.";

/// Passage length shown to the selection model per entry.
const EXCERPT_CHARS: usize = 300;

/// Narrows a retrieval pool to the final picks via an LLM index selection,
/// falling back to similarity order when the model misbehaves.
pub struct HybridReranker {
    gateway: Arc<dyn JudgmentGateway>,
    timeout: Duration,
}

impl HybridReranker {
    #[inline]
    pub fn new(gateway: Arc<dyn JudgmentGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Picks `final_count` matches from `pool`.
    ///
    /// Never fails: any gateway error, timeout, or unusable selection falls
    /// back to the top of the similarity-ordered pool.
    pub async fn rerank(
        &self,
        profile: &CandidateProfile,
        mut pool: Vec<DocumentMatch>,
        final_count: usize,
    ) -> Vec<DocumentMatch> {
        if pool.len() <= final_count {
            return pool;
        }

        let entries: Vec<RerankEntry> = pool
            .iter()
            .map(|m| RerankEntry {
                title: m.title.clone(),
                author: m.author.clone(),
                published_at: m.published_at,
                score: m.score,
                excerpt: truncate_chars(&m.passage, EXCERPT_CHARS),
            })
            .collect();

        let selection = crate::gateway::with_deadline(
            self.timeout,
            "rerank selection",
            self.gateway
                .select_indices(&profile.summary_context(), &entries, SELECTION_RUBRIC, final_count),
        )
        .await;

        let mut picks = match selection {
            Ok(indices) => validate_selection(&indices, pool.len()),
            Err(error) => {
                warn!("Rerank selection failed, using similarity order: {}", error);
                Vec::new()
            }
        };
        // The model is asked for exactly final_count; never emit more even
        // when it over-returns.
        picks.truncate(final_count);

        if picks.is_empty() {
            debug!("No usable selection, falling back to top {} by similarity", final_count);
            pool.truncate(final_count);
            return pool;
        }

        picks.into_iter().map(|i| pool[i].clone()).collect()
    }
}

/// Converts a 1-indexed model selection into zero-based pool positions,
/// dropping out-of-range entries and collapsing duplicates while keeping the
/// model's order.
fn validate_selection(indices: &[usize], pool_len: usize) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&index| {
            if index == 0 || index > pool_len {
                warn!("Dropping out-of-range selection index {}", index);
                return false;
            }
            true
        })
        .map(|index| index - 1)
        .unique()
        .collect()
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

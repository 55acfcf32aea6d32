use super::*;
use crate::gateway::{Judgment, ReviewRequest};
use crate::{MatchError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

struct StubJudgment {
    indices: Result<Vec<usize>>,
    calls: AtomicUsize,
}

impl StubJudgment {
    fn returning(indices: Result<Vec<usize>>) -> Self {
        Self {
            indices,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JudgmentGateway for StubJudgment {
    async fn select_indices(
        &self,
        _subject_summary: &str,
        _entries: &[RerankEntry],
        _rubric: &str,
        _count: usize,
    ) -> Result<Vec<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.indices {
            Ok(v) => Ok(v.clone()),
            Err(_) => Err(MatchError::Gateway("stubbed failure".to_string())),
        }
    }

    async fn judge(
        &self,
        _subject_summary: &str,
        _target: &ReviewRequest,
        _rubric: &str,
    ) -> Result<Judgment> {
        unreachable!("reranking never reviews individual targets")
    }
}

fn doc(id: &str, score: f32) -> DocumentMatch {
    DocumentMatch {
        document_id: id.to_string(),
        title: format!("Post {}", id),
        url: format!("https://blog.example.com/{}", id),
        author: None,
        published_at: None,
        featured_image: None,
        passage: "Some article body.".to_string(),
        score,
    }
}

fn pool(n: usize) -> Vec<DocumentMatch> {
    (0..n).map(|i| doc(&format!("d{}", i), 1.0 - i as f32 * 0.01)).collect()
}

fn reranker(stub: StubJudgment) -> (Arc<StubJudgment>, HybridReranker) {
    let stub = Arc::new(stub);
    let gateway = Arc::clone(&stub) as Arc<dyn JudgmentGateway>;
    (stub, HybridReranker::new(gateway, Duration::from_secs(5)))
}

#[tokio::test]
async fn small_pool_short_circuits_without_gateway_call() {
    let (stub, reranker) = reranker(StubJudgment::returning(Ok(vec![1])));
    let profile = CandidateProfile::default();
    let input = pool(3);

    let result = reranker.rerank(&profile, input.clone(), 3).await;

    assert_eq!(result, input);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn selection_indices_are_one_indexed() {
    let (_, reranker) = reranker(StubJudgment::returning(Ok(vec![3, 1, 2])));
    let profile = CandidateProfile::default();

    let result = reranker.rerank(&profile, pool(10), 3).await;

    let ids: Vec<&str> = result.iter().map(|m| m.document_id.as_str()).collect();
    assert_eq!(ids, vec!["d2", "d0", "d1"]);
}

#[tokio::test]
async fn duplicates_and_out_of_range_indices_are_dropped() {
    let (_, reranker) = reranker(StubJudgment::returning(Ok(vec![2, 5, 2, 99])));
    let profile = CandidateProfile::default();

    let result = reranker.rerank(&profile, pool(30), 3).await;

    let ids: Vec<&str> = result.iter().map(|m| m.document_id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d4"]);
}

#[tokio::test]
async fn overlong_selection_is_capped_at_final_count() {
    let (_, reranker) = reranker(StubJudgment::returning(Ok(vec![1, 2, 3, 4, 5, 6])));
    let profile = CandidateProfile::default();

    let result = reranker.rerank(&profile, pool(10), 3).await;

    let ids: Vec<&str> = result.iter().map(|m| m.document_id.as_str()).collect();
    assert_eq!(ids, vec!["d0", "d1", "d2"]);
}

#[tokio::test]
async fn gateway_error_falls_back_to_similarity_order() {
    let (_, reranker) = reranker(StubJudgment::returning(Err(MatchError::Gateway(
        "boom".to_string(),
    ))));
    let profile = CandidateProfile::default();

    let result = reranker.rerank(&profile, pool(10), 3).await;

    let ids: Vec<&str> = result.iter().map(|m| m.document_id.as_str()).collect();
    assert_eq!(ids, vec!["d0", "d1", "d2"]);
}

#[tokio::test]
async fn empty_selection_falls_back_to_similarity_order() {
    let (_, reranker) = reranker(StubJudgment::returning(Ok(vec![])));
    let profile = CandidateProfile::default();

    let result = reranker.rerank(&profile, pool(10), 2).await;

    let ids: Vec<&str> = result.iter().map(|m| m.document_id.as_str()).collect();
    assert_eq!(ids, vec!["d0", "d1"]);
}

#[test]
fn excerpts_truncate_on_char_boundaries() {
    let text = "é".repeat(400);

    let excerpt = truncate_chars(&text, 300);

    assert!(excerpt.ends_with("..."));
    assert_eq!(excerpt.chars().count(), 303);
}

#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end pipeline tests over in-process fake gateways.
// Run with: cargo test --test integration_pipeline

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use talent_match::config::MatchingConfig;
use talent_match::gateway::{
    Confidence, EmbeddingGateway, Judgment, JudgmentGateway, PassageHit, RerankEntry,
    ReviewRequest, SimilarityGateway,
};
use talent_match::matcher::{
    CancelFlag, EligibilityMatcher, JobPosting, JobStatus, MatchOptions,
};
use talent_match::profile::{CandidateProfile, ProfileField, ProfileVector};
use talent_match::ranking::HybridReranker;
use talent_match::recommend::Recommender;
use talent_match::retrieval::DocumentRetriever;
use talent_match::{MatchError, Result};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Serves a fixed corpus of passages, honoring threshold and result cap the
/// way the real provider does.
struct FakeSearch {
    corpus: Vec<PassageHit>,
}

#[async_trait]
impl SimilarityGateway for FakeSearch {
    async fn search(
        &self,
        _query_vector: &[f32],
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<PassageHit>> {
        let mut hits: Vec<PassageHit> = self
            .corpus
            .iter()
            .filter(|h| h.score >= threshold)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(max_results);
        Ok(hits)
    }
}

/// Embeds by keyword lookup so similarity outcomes are under test control.
struct FakeEmbeddings;

#[async_trait]
impl EmbeddingGateway for FakeEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("backend") {
            Ok(vec![1.0, 0.0, 0.0])
        } else if text.contains("frontend") {
            Ok(vec![0.0, 1.0, 0.0])
        } else if text.contains("hybrid") {
            Ok(vec![0.7, 0.7, 0.0])
        } else {
            Err(MatchError::Gateway(format!("no embedding for: {text}")))
        }
    }
}

/// Scripted judgments: selects the configured indices and accepts the
/// configured posting ids.
struct FakeJudge {
    selections: Vec<usize>,
    accept_ids: Vec<&'static str>,
    reviews: Mutex<Vec<String>>,
}

#[async_trait]
impl JudgmentGateway for FakeJudge {
    async fn select_indices(
        &self,
        _subject_summary: &str,
        _entries: &[RerankEntry],
        _rubric: &str,
        _count: usize,
    ) -> Result<Vec<usize>> {
        Ok(self.selections.clone())
    }

    async fn judge(
        &self,
        _subject_summary: &str,
        target: &ReviewRequest,
        _rubric: &str,
    ) -> Result<Judgment> {
        self.reviews.lock().unwrap().push(target.target_id.clone());
        let accept = self.accept_ids.iter().any(|id| *id == target.target_id);
        Ok(Judgment {
            accept,
            confidence: Confidence::Medium,
            score: if accept { 80 } else { 30 },
            reasoning: "scripted review".to_string(),
        })
    }
}

fn passage(document_id: &str, title: &str, score: f32) -> PassageHit {
    PassageHit {
        document_id: document_id.to_string(),
        title: title.to_string(),
        url: format!("https://blog.example.com/{document_id}"),
        author: Some("Dana".to_string()),
        published_at: None,
        featured_image: None,
        content: format!("Body of {title}."),
        score,
    }
}

fn candidate() -> CandidateProfile {
    CandidateProfile {
        candidate_id: "cand-42".to_string(),
        full_name: "Sam Park".to_string(),
        current_title: "Backend Engineer".to_string(),
        professional_summary: "Distributed systems, backend services".to_string(),
        vectors: vec![ProfileVector {
            field: ProfileField::ProfessionalSummary,
            embedding: vec![1.0, 0.0, 0.0],
        }],
        ..CandidateProfile::default()
    }
}

fn posting(id: &str, description: &str) -> JobPosting {
    JobPosting {
        id: id.to_string(),
        position: "Engineer".to_string(),
        company: "Acme".to_string(),
        required_competencies: vec!["Rust".to_string()],
        optional_competencies: Vec::new(),
        seniority: None,
        status: JobStatus::Active,
        description: description.to_string(),
        embedding: None,
    }
}

#[tokio::test]
async fn recommend_flow_with_diversity_filter() {
    let corpus = vec![
        passage("a", "Careers at Acme", 0.9),
        passage("b", "Sharding the write path", 0.85),
        // Duplicate document: the retriever must keep the better passage.
        passage("b", "Sharding the write path", 0.6),
        passage("c", "Life at Acme HQ", 0.8),
        passage("d", "Batching RPCs for fun and profit", 0.75),
        passage("e", "Below the retrieval floor", 0.1),
    ];

    let retriever = DocumentRetriever::new(Arc::new(FakeSearch { corpus }), TIMEOUT);
    let reranker = HybridReranker::new(
        Arc::new(FakeJudge {
            selections: vec![],
            accept_ids: vec![],
            reviews: Mutex::new(Vec::new()),
        }),
        TIMEOUT,
    );
    let recommender = Recommender::new(retriever, reranker, MatchingConfig::default());

    let set = recommender.recommend(&candidate()).await.unwrap();

    assert_eq!(set.candidate_id, "cand-42");
    let titles: Vec<&str> = set.articles.iter().map(|a| a.title.as_str()).collect();
    // Substantive articles first, one generic backfill, nothing below threshold.
    assert_eq!(
        titles,
        vec![
            "Sharding the write path",
            "Batching RPCs for fun and profit",
            "Careers at Acme"
        ]
    );
    assert!((set.articles[0].relevance_percent - 85.0).abs() < 1e-6);
}

#[tokio::test]
async fn recommend_flow_with_reranker() {
    let corpus: Vec<PassageHit> = (0..10)
        .map(|i| passage(&format!("d{i}"), &format!("Article {i}"), 0.9 - i as f32 * 0.03))
        .collect();

    let retriever = DocumentRetriever::new(Arc::new(FakeSearch { corpus }), TIMEOUT);
    let reranker = HybridReranker::new(
        Arc::new(FakeJudge {
            selections: vec![4, 1, 9],
            accept_ids: vec![],
            reviews: Mutex::new(Vec::new()),
        }),
        TIMEOUT,
    );
    let recommender = Recommender::new(retriever, reranker, MatchingConfig::default());

    let set = recommender.recommend_reranked(&candidate()).await.unwrap();

    let titles: Vec<&str> = set.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Article 3", "Article 0", "Article 8"]);
}

#[tokio::test]
async fn match_jobs_flow_confirms_only_accepted_postings() {
    let judge = Arc::new(FakeJudge {
        selections: vec![],
        accept_ids: vec!["backend-1", "hybrid-1"],
        reviews: Mutex::new(Vec::new()),
    });
    let matcher = EligibilityMatcher::new(
        Arc::new(FakeEmbeddings),
        Arc::clone(&judge) as Arc<dyn JudgmentGateway>,
        4,
        TIMEOUT,
    );

    let mut inactive = posting("closed-1", "backend role, already closed");
    inactive.status = JobStatus::Closed;

    let targets = vec![
        posting("backend-1", "backend services team"),
        posting("frontend-1", "frontend component library"),
        posting("hybrid-1", "hybrid backend and frontend"),
        posting("backend-2", "another backend opening"),
        inactive,
    ];

    let opts = MatchOptions {
        similarity_threshold: 0.35,
        review_cap: 5,
        final_cap: 3,
    };

    let matches = matcher
        .match_eligible(&candidate(), &targets, &opts, &CancelFlag::new())
        .await
        .unwrap();

    // backend-2 was reviewed but not accepted; frontend-1 failed the gate.
    let ids: Vec<&str> = matches.iter().map(|m| m.posting.id.as_str()).collect();
    assert_eq!(ids, vec!["backend-1", "hybrid-1"]);
    assert!(matches[0].similarity >= matches[1].similarity);
    assert!(matches.iter().all(|m| m.similarity >= 0.35));
    assert!(matches.iter().all(|m| m.judgment.accept));

    let reviews = judge.reviews.lock().unwrap();
    assert!(!reviews.contains(&"frontend-1".to_string()));
    assert!(!reviews.contains(&"closed-1".to_string()));
    assert!(reviews.contains(&"backend-2".to_string()));
}

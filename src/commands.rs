use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, get_config_dir};
use crate::gateway::http::{CompletionClient, EmbeddingClient, VectorSearchClient};
use crate::matcher::{CancelFlag, EligibilityMatcher, JobPosting, MatchOptions};
use crate::profile::CandidateProfile;
use crate::ranking::HybridReranker;
use crate::recommend::{RecommendationSet, Recommender};
use crate::retrieval::DocumentRetriever;

/// Recommend articles for a single candidate profile
#[inline]
pub async fn recommend(profile_path: &Path, rerank: bool, count: Option<usize>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(count) = count {
        config
            .matching
            .set_final_count(count)
            .context("Invalid --count value")?;
    }

    let profile = load_profile(profile_path)?;
    let recommender = build_recommender(&config)?;

    let set = if rerank {
        recommender.recommend_reranked(&profile).await?
    } else {
        recommender.recommend(&profile).await?
    };

    print_recommendations(&set);
    Ok(())
}

/// Recommend articles for every profile in a JSON array, with progress
#[inline]
pub async fn batch_recommend(
    profiles_path: &Path,
    rerank: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let content = fs::read_to_string(profiles_path)
        .with_context(|| format!("Failed to read profiles file: {}", profiles_path.display()))?;
    let profiles: Vec<CandidateProfile> =
        serde_json::from_str(&content).context("Failed to parse profiles JSON")?;

    if profiles.is_empty() {
        println!("No profiles to process.");
        return Ok(());
    }

    let recommender = build_recommender(&config)?;

    let progress = ProgressBar::new(profiles.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );

    let mut results: Vec<RecommendationSet> = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        progress.set_message(profile.full_name.clone());
        let set = if rerank {
            recommender.recommend_reranked(profile).await
        } else {
            recommender.recommend(profile).await
        };
        match set {
            Ok(set) => results.push(set),
            Err(e) => {
                // One bad profile should not sink the batch.
                warn!(candidate = %profile.candidate_id, "skipping profile: {}", e);
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        processed = results.len(),
        skipped = profiles.len() - results.len(),
        "batch recommendation complete"
    );

    match output {
        Some(path) => {
            let json =
                serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
            fs::write(path, json)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            println!("Wrote {} recommendation sets to {}", results.len(), path.display());
        }
        None => {
            for set in &results {
                print_recommendations(set);
                println!();
            }
        }
    }

    Ok(())
}

/// Match a candidate against a file of job postings
#[inline]
pub async fn match_jobs(profile_path: &Path, jobs_path: &Path) -> Result<()> {
    let config = load_config()?;
    let profile = load_profile(profile_path)?;

    let content = fs::read_to_string(jobs_path)
        .with_context(|| format!("Failed to read jobs file: {}", jobs_path.display()))?;
    let postings: Vec<JobPosting> =
        serde_json::from_str(&content).context("Failed to parse jobs JSON")?;

    let timeout = Duration::from_secs(config.gateways.timeout_secs);
    let matcher = EligibilityMatcher::new(
        Arc::new(EmbeddingClient::new(&config.gateways)?),
        Arc::new(CompletionClient::new(&config.gateways)?),
        config.matching.stage1_concurrency,
        timeout,
    );
    let opts = MatchOptions {
        similarity_threshold: config.matching.job_similarity_threshold,
        review_cap: config.matching.review_cap,
        final_cap: config.matching.final_cap,
    };

    // Ctrl-C stops cleanly between reviews.
    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.cancel();
        }
    });

    let matches = matcher
        .match_eligible(&profile, &postings, &opts, &cancel)
        .await?;

    if matches.is_empty() {
        println!(
            "No eligible openings for {} ({} postings considered).",
            profile.full_name,
            postings.len()
        );
        return Ok(());
    }

    println!(
        "{}",
        style(format!("Eligible openings for {}:", profile.full_name)).bold()
    );
    println!();
    for m in &matches {
        println!(
            "💼 {} at {} ({:.1}% similar)",
            style(&m.posting.position).cyan(),
            m.posting.company,
            m.similarity * 100.0
        );
        println!(
            "   Review: {:?} confidence, score {}",
            m.judgment.confidence, m.judgment.score
        );
        println!("   {}", m.judgment.reasoning);
    }

    Ok(())
}

/// Show configuration summary and gateway health
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("{}", style("Talent Match Status").bold().cyan());
    println!();
    println!("Search gateway: {}", config.gateways.search.url()?);
    println!("LLM gateway:    {}", config.gateways.llm.url()?);
    println!("Embedding model: {}", config.gateways.embedding_model);
    println!("Completion model: {}", config.gateways.completion_model);
    println!();

    let search = VectorSearchClient::new(&config.gateways)?;
    let llm = CompletionClient::new(&config.gateways)?;
    let (search_ok, llm_ok) =
        tokio::task::spawn_blocking(move || (search.ping().is_ok(), llm.ping().is_ok()))
            .await
            .unwrap_or((false, false));

    if search_ok {
        println!("{}", style("✓ Search gateway reachable").green());
    } else {
        println!("{}", style("✗ Search gateway unreachable").red());
    }
    if llm_ok {
        println!("{}", style("✓ LLM gateway reachable").green());
    } else {
        println!("{}", style("✗ LLM gateway unreachable").red());
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    Config::load(&config_dir).context("Failed to load configuration")
}

fn load_profile(path: &Path) -> Result<CandidateProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse profile JSON")
}

fn build_recommender(config: &Config) -> Result<Recommender> {
    let timeout = Duration::from_secs(config.gateways.timeout_secs);
    let retriever = DocumentRetriever::new(
        Arc::new(VectorSearchClient::new(&config.gateways)?),
        timeout,
    );
    let reranker = HybridReranker::new(Arc::new(CompletionClient::new(&config.gateways)?), timeout);
    Ok(Recommender::new(retriever, reranker, config.matching.clone()))
}

fn print_recommendations(set: &RecommendationSet) {
    if set.articles.is_empty() {
        println!("No recommendations for {}.", set.full_name);
        return;
    }

    println!(
        "{}",
        style(format!("Recommendations for {}:", set.full_name)).bold()
    );
    for article in &set.articles {
        println!(
            "📄 {} ({:.1}% relevant)",
            style(&article.title).cyan(),
            article.relevance_percent
        );
        if let Some(author) = &article.author {
            match article.published_at {
                Some(date) => println!("   by {} on {}", author, date),
                None => println!("   by {}", author),
            }
        }
        println!("   {}", article.url);
        println!("   {}", article.excerpt);
    }
}

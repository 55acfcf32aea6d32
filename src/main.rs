use clap::{Parser, Subcommand};
use std::path::PathBuf;
use talent_match::Result;
use talent_match::commands::{batch_recommend, match_jobs, recommend, show_status};
use talent_match::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "talent-match")]
#[command(about = "Candidate-to-content and candidate-to-job matching over vector similarity")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure gateway endpoints and matching tuning
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Recommend articles for a candidate profile
    Recommend {
        /// Path to the candidate profile JSON file
        profile: PathBuf,
        /// Use the LLM reranker instead of the diversity filter
        #[arg(long)]
        rerank: bool,
        /// Override the number of recommendations
        #[arg(long)]
        count: Option<usize>,
    },
    /// Recommend articles for every profile in a JSON array
    BatchRecommend {
        /// Path to the profiles JSON file
        profiles: PathBuf,
        /// Use the LLM reranker instead of the diversity filter
        #[arg(long)]
        rerank: bool,
        /// Write results to a JSON file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Match a candidate against a file of job postings
    MatchJobs {
        /// Path to the candidate profile JSON file
        profile: PathBuf,
        /// Path to the job postings JSON file
        jobs: PathBuf,
    },
    /// Show configuration summary and gateway health
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Recommend {
            profile,
            rerank,
            count,
        } => {
            recommend(&profile, rerank, count).await?;
        }
        Commands::BatchRecommend {
            profiles,
            rerank,
            output,
        } => {
            batch_recommend(&profiles, rerank, output.as_deref()).await?;
        }
        Commands::MatchJobs { profile, jobs } => {
            match_jobs(&profile, &jobs).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["talent-match", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn recommend_command_with_profile() {
        let cli = Cli::try_parse_from(["talent-match", "recommend", "profile.json"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Recommend {
                profile,
                rerank,
                count,
            } = parsed.command
            {
                assert_eq!(profile, PathBuf::from("profile.json"));
                assert!(!rerank);
                assert_eq!(count, None);
            }
        }
    }

    #[test]
    fn recommend_command_with_rerank() {
        let cli = Cli::try_parse_from([
            "talent-match",
            "recommend",
            "profile.json",
            "--rerank",
            "--count",
            "5",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Recommend { rerank, count, .. } = parsed.command {
                assert!(rerank);
                assert_eq!(count, Some(5));
            }
        }
    }

    #[test]
    fn match_jobs_requires_both_paths() {
        let cli = Cli::try_parse_from(["talent-match", "match-jobs", "profile.json"]);
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["talent-match", "match-jobs", "profile.json", "jobs.json"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["talent-match", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["talent-match", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["talent-match", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}

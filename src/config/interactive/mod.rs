
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, EndpointConfig, GatewayConfig, MatchingConfig, get_config_dir};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Talent Match Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Vector Search Gateway").bold().yellow());
    eprintln!("Configure the similarity-search provider used for retrieval.");
    eprintln!();
    configure_endpoint(&mut config.gateways.search, "Search")?;

    eprintln!();
    eprintln!("{}", style("LLM Gateway").bold().yellow());
    eprintln!("Configure the provider serving embeddings and completions.");
    eprintln!();
    configure_endpoint(&mut config.gateways.llm, "LLM")?;
    configure_models(&mut config.gateways)?;

    eprintln!();
    eprintln!("{}", style("Matching Tuning").bold().yellow());
    configure_matching(&mut config.matching)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_endpoint_connection(&config.gateways.llm)? {
        eprintln!("{}", style("✓ LLM gateway reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the LLM gateway").yellow()
        );
        eprintln!("You can continue, but matching will fail until it is running.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Gateways:").bold().yellow());
    print_endpoint("Search", &config.gateways.search);
    print_endpoint("LLM", &config.gateways.llm);
    eprintln!(
        "  Embedding model: {}",
        style(&config.gateways.embedding_model).cyan()
    );
    eprintln!(
        "  Completion model: {}",
        style(&config.gateways.completion_model).cyan()
    );
    eprintln!(
        "  Timeout: {}s, retries: {}",
        style(config.gateways.timeout_secs).cyan(),
        style(config.gateways.retry_attempts).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Matching:").bold().yellow());
    eprintln!(
        "  Retrieval threshold: {}",
        style(config.matching.retrieval_threshold).cyan()
    );
    eprintln!(
        "  Pool size: {}, recommendations: {}",
        style(config.matching.retrieval_pool_size).cyan(),
        style(config.matching.final_count).cyan()
    );
    eprintln!(
        "  Job similarity threshold: {}",
        style(config.matching.job_similarity_threshold).cyan()
    );
    eprintln!(
        "  Review cap: {}, final cap: {}",
        style(config.matching.review_cap).cyan(),
        style(config.matching.final_cap).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn print_endpoint(label: &str, endpoint: &EndpointConfig) {
    match endpoint.url() {
        Ok(url) => eprintln!("  {} URL: {}", label, style(url).cyan()),
        Err(e) => eprintln!("  {} URL: {} ({})", label, style("Invalid").red(), e),
    }
}

fn configure_endpoint(endpoint: &mut EndpointConfig, label: &str) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == endpoint.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt(format!("{} protocol", label))
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt(format!("{} host", label))
        .default(endpoint.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = EndpointConfig {
                protocol: "http".to_string(),
                host: input.clone(),
                port: 8080,
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt(format!("{} port", label))
        .default(endpoint.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    endpoint.set_protocol(protocol)?;
    endpoint.set_host(host)?;
    endpoint.set_port(port)?;

    Ok(())
}

fn configure_models(gateways: &mut GatewayConfig) -> Result<()> {
    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(gateways.embedding_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let completion_model: String = Input::new()
        .with_prompt("Completion model")
        .default(gateways.completion_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    gateways.set_embedding_model(embedding_model)?;
    gateways.set_completion_model(completion_model)?;

    Ok(())
}

fn configure_matching(matching: &mut MatchingConfig) -> Result<()> {
    let retrieval_threshold: f32 = Input::new()
        .with_prompt("Minimum similarity for article retrieval")
        .default(matching.retrieval_threshold)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=1.0).contains(input) {
                Ok(())
            } else {
                Err("Threshold must be between 0 and 1")
            }
        })
        .interact_text()?;

    let job_similarity_threshold: f32 = Input::new()
        .with_prompt("Minimum similarity for job matching")
        .default(matching.job_similarity_threshold)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=1.0).contains(input) {
                Ok(())
            } else {
                Err("Threshold must be between 0 and 1")
            }
        })
        .interact_text()?;

    let final_count: usize = Input::new()
        .with_prompt("Recommendations per candidate")
        .default(matching.final_count)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Count must be at least 1")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    matching.set_retrieval_threshold(retrieval_threshold)?;
    matching.set_job_similarity_threshold(job_similarity_threshold)?;
    matching.set_final_count(final_count)?;

    Ok(())
}

fn test_endpoint_connection(endpoint: &EndpointConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/v1/health",
        endpoint.protocol, endpoint.host, endpoint.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}

use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.gateways.search.protocol, "http");
    assert_eq!(config.gateways.search.host, "localhost");
    assert_eq!(config.gateways.timeout_secs, 30);
    assert_eq!(config.gateways.retry_attempts, 3);
    assert!((config.matching.retrieval_threshold - 0.25).abs() < f32::EPSILON);
    assert!((config.matching.job_similarity_threshold - 0.35).abs() < f32::EPSILON);
    assert_eq!(config.matching.retrieval_pool_size, 30);
    assert_eq!(config.matching.final_count, 3);
    assert_eq!(config.matching.excluded_title_markers.len(), 5);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.gateways.search.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.gateways.llm.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.gateways.embedding_model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.matching.retrieval_threshold = 1.5;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.matching.final_count = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.matching.stage1_concurrency = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.gateways.timeout_secs = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn endpoint_url_generation() {
    let config = Config::default();
    let url = config
        .gateways
        .search
        .url()
        .expect("should generate search url successfully");
    assert_eq!(url.as_str(), "http://localhost:6334/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn setter_validation() {
    let mut endpoint = EndpointConfig::default();

    assert!(endpoint.set_protocol("https".to_string()).is_ok());
    assert!(endpoint.set_host("example.com".to_string()).is_ok());
    assert!(endpoint.set_port(9000).is_ok());

    assert!(endpoint.set_protocol("ftp".to_string()).is_err());
    assert!(endpoint.set_port(0).is_err());

    let mut gateways = GatewayConfig::default();
    assert!(gateways.set_embedding_model("new-model".to_string()).is_ok());
    assert!(gateways.set_embedding_model(String::new()).is_err());
    assert!(gateways.set_timeout_secs(60).is_ok());
    assert!(gateways.set_timeout_secs(0).is_err());
    assert!(gateways.set_timeout_secs(301).is_err());

    let mut matching = MatchingConfig::default();
    assert!(matching.set_retrieval_threshold(0.5).is_ok());
    assert!(matching.set_retrieval_threshold(-0.1).is_err());
    assert!(matching.set_job_similarity_threshold(1.1).is_err());
    assert!(matching.set_final_count(5).is_ok());
    assert!(matching.set_final_count(0).is_err());
}

#[test]
fn load_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.base_dir, temp_dir.path());
    assert!(config.validate().is_ok());
    assert_eq!(config.matching.final_cap, 3);
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load(temp_dir.path()).expect("should load defaults");
    config.matching.final_count = 5;
    config.gateways.llm.port = 9999;
    config.save().expect("should save config");

    let reloaded = Config::load(temp_dir.path()).expect("should reload config");
    assert_eq!(reloaded.matching.final_count, 5);
    assert_eq!(reloaded.gateways.llm.port, 9999);
}

#[test]
fn invalid_config_fails_to_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[matching]\nretrieval_threshold = 7.0\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.docs_dir, PathBuf::from("docs"));
    assert_eq!(config.index_path, PathBuf::from("knowledge_index"));
    assert_eq!(config.service.base_url, "https://api.openai.com/v1/");
    assert_eq!(config.service.embedding_model, "text-embedding-ada-002");
    assert_eq!(config.service.completion_model, "gpt-3.5-turbo-instruct");
    assert_eq!(config.chunking.chunk_size, 2000);
    assert_eq!(config.chunking.chunk_overlap, 400);
    assert_eq!(config.retrieval.top_k, 5);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.service.base_url = "ftp://example.com".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.service.base_url = "not a url".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.service.embedding_model = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.service.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.service.temperature = 2.5;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config;
    invalid_config.chunking.chunk_overlap = invalid_config.chunking.chunk_size;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::OverlapTooLarge(_, _))
    ));
}

#[test]
fn service_url_gains_trailing_slash() {
    let mut config = Config::default();
    config.service.base_url = "http://localhost:11434/v1".to_string();

    let url = config
        .service_url()
        .expect("should generate service url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/v1/");
    assert_eq!(
        url.join("embeddings").expect("can join").as_str(),
        "http://localhost:11434/v1/embeddings"
    );
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let partial_toml = r#"
        docs_dir = "course-docs"

        [retrieval]
        top_k = 3
    "#;

    let config: Config = toml::from_str(partial_toml).expect("should parse partial toml");
    assert_eq!(config.docs_dir, PathBuf::from("course-docs"));
    assert_eq!(config.index_path, PathBuf::from("knowledge_index"));
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn setter_validation() {
    let mut service = ServiceConfig::default();

    assert!(service.set_base_url("http://localhost:8080/v1/".to_string()).is_ok());
    assert!(service.set_embedding_model("nomic-embed-text".to_string()).is_ok());
    assert!(service.set_completion_model("llama3".to_string()).is_ok());
    assert!(service.set_batch_size(128).is_ok());
    assert!(service.set_temperature(0.0).is_ok());

    assert!(service.set_base_url("ws://localhost".to_string()).is_err());
    assert!(service.set_embedding_model(String::new()).is_err());
    assert!(service.set_api_key_env(" ".to_string()).is_err());
    assert!(service.set_batch_size(0).is_err());
    assert!(service.set_temperature(-0.1).is_err());

    assert_eq!(service.base_url, "http://localhost:8080/v1/");
    assert_eq!(service.batch_size, 128);

    let mut retrieval = RetrievalConfig::default();
    assert!(retrieval.set_top_k(8).is_ok());
    assert!(retrieval.set_top_k(51).is_err());
    assert_eq!(retrieval.top_k, 8);
}

#[test]
fn chunking_setter_checks_both_values() {
    let mut config = Config::default();

    assert!(config.set_chunking(1000, 100).is_ok());
    assert!(matches!(
        config.set_chunking(500, 500),
        Err(ConfigError::OverlapTooLarge(500, 500))
    ));
    assert!(config.set_chunking(9000, 100).is_err());

    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 100);
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing config should load defaults");

    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.service, ServiceConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn save_then_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config {
        base_dir: temp_dir.path().join("nested"),
        ..Config::default()
    };
    config.retrieval.top_k = 7;
    config.service.completion_model = "local-model".to_string();
    config.save().expect("should save config");

    let loaded = Config::load(temp_dir.path().join("nested")).expect("should load saved config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[chunking]\nchunk_size = 500\nchunk_overlap = 600\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
#[serial]
fn api_key_prefers_environment() {
    let service = ServiceConfig {
        api_key_env: "ENROLMENT_ASSISTANT_TEST_KEY".to_string(),
        api_key: Some("from-file".to_string()),
        ..ServiceConfig::default()
    };

    // SAFETY: serialised test, no other thread reads this variable
    unsafe { env::remove_var("ENROLMENT_ASSISTANT_TEST_KEY") };
    assert_eq!(service.api_key().as_deref(), Some("from-file"));

    // SAFETY: serialised test, no other thread reads this variable
    unsafe { env::set_var("ENROLMENT_ASSISTANT_TEST_KEY", "from-env") };
    assert_eq!(service.api_key().as_deref(), Some("from-env"));

    // SAFETY: serialised test, no other thread reads this variable
    unsafe { env::remove_var("ENROLMENT_ASSISTANT_TEST_KEY") };
}

#[test]
#[serial]
fn api_key_absent() {
    let service = ServiceConfig {
        api_key_env: "ENROLMENT_ASSISTANT_UNSET_KEY".to_string(),
        api_key: None,
        ..ServiceConfig::default()
    };

    // SAFETY: serialised test, no other thread reads this variable
    unsafe { env::remove_var("ENROLMENT_ASSISTANT_UNSET_KEY") };
    assert_eq!(service.api_key(), None);
}

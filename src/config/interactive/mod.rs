
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::{Config, ConfigError, RetrievalConfig, ServiceConfig};
use crate::embeddings::{ChunkingConfig, OpenAiClient};

const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Enrolment Assistant Configuration").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Service").bold().yellow());
    eprintln!("Any OpenAI-compatible endpoint serving embeddings and completions.");
    eprintln!();
    configure_service(&mut config.service)?;

    eprintln!();
    eprintln!("{}", style("Documents and Retrieval").bold().yellow());
    configure_corpus(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    match test_service_connection(&config.service) {
        Ok(()) => eprintln!("{}", style("✓ Service connection successful!").green()),
        Err(e) => {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not reach the service").yellow()
            );
            eprintln!("  {:#}", e);
            eprintln!("You can continue, but indexing and chat need a reachable service.");
        }
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
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    for line in describe_config(&config) {
        eprintln!("{}", line);
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

/// Human-readable summary of the settings, one line per entry
fn describe_config(config: &Config) -> Vec<String> {
    let service = &config.service;
    let key_status = match (service.api_key(), &service.api_key) {
        (None, _) => style("not set").red().to_string(),
        (Some(_), Some(_)) if std::env::var(&service.api_key_env).is_err() => {
            style("from settings file").cyan().to_string()
        }
        (Some(_), _) => style(format!("from ${}", service.api_key_env))
            .cyan()
            .to_string(),
    };

    let url = match service.service_url() {
        Ok(url) => style(url.to_string()).cyan().to_string(),
        Err(e) => format!("{} ({})", style("Invalid").red(), e),
    };

    vec![
        style("Service:").bold().yellow().to_string(),
        format!("  Base URL: {}", url),
        format!("  API key: {}", key_status),
        format!("  Embedding model: {}", style(&service.embedding_model).cyan()),
        format!("  Completion model: {}", style(&service.completion_model).cyan()),
        format!("  Max tokens: {}", style(service.max_tokens).cyan()),
        format!("  Temperature: {}", style(service.temperature).cyan()),
        format!("  Batch size: {}", style(service.batch_size).cyan()),
        format!("  Timeout: {}s", style(service.timeout_seconds).cyan()),
        String::new(),
        style("Documents:").bold().yellow().to_string(),
        format!("  Docs directory: {}", style(config.docs_dir.display()).cyan()),
        format!("  Index path: {}", style(config.index_path.display()).cyan()),
        format!(
            "  Chunk size / overlap: {} / {}",
            style(config.chunking.chunk_size).cyan(),
            style(config.chunking.chunk_overlap).cyan()
        ),
        format!("  Passages per question: {}", style(config.retrieval.top_k).cyan()),
    ]
}

fn load_existing_config() -> Result<Config> {
    match Config::load_default() {
        Ok(config) if config.config_file_path().exists() => {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        }
        Ok(config) => {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(config)
        }
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("Existing configuration is unusable ({:#}). Using defaults.", e))
                    .yellow()
            );
            Ok(Config {
                base_dir: Config::config_dir()?,
                ..Config::default()
            })
        }
    }
}

fn configure_service(service: &mut ServiceConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("Service base URL")
        .default(service.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            ServiceConfig {
                base_url: input.clone(),
                ..ServiceConfig::default()
            }
            .service_url()
            .map(|_| ())
        })
        .interact_text()?;

    let api_key_env: String = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(service.api_key_env.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Variable name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let store_key = Confirm::new()
        .with_prompt("Store an API key in the settings file instead?")
        .default(service.api_key.is_some())
        .interact()?;
    let api_key = if store_key {
        let key = Password::new()
            .with_prompt("API key (leave empty to keep the current one)")
            .allow_empty_password(true)
            .interact()?;
        if key.trim().is_empty() {
            service.api_key.clone()
        } else {
            Some(key.trim().to_string())
        }
    } else {
        None
    };

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(service.embedding_model.clone())
        .validate_with(non_empty_model)
        .interact_text()?;

    let completion_model: String = Input::new()
        .with_prompt("Completion model")
        .default(service.completion_model.clone())
        .validate_with(non_empty_model)
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(service.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding requests")
        .default(service.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 2048 {
                Err("Batch size must be 2048 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    service.set_base_url(base_url)?;
    service.set_api_key_env(api_key_env)?;
    service.api_key = api_key;
    service.set_embedding_model(embedding_model)?;
    service.set_completion_model(completion_model)?;
    service.set_temperature(temperature)?;
    service.set_batch_size(batch_size)?;

    Ok(())
}

#[expect(clippy::ptr_arg, reason = "dialoguer validators receive &T")]
fn non_empty_model(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Model name cannot be empty")
    } else {
        Ok(())
    }
}

fn configure_corpus(config: &mut Config) -> Result<()> {
    let docs_dir: String = Input::new()
        .with_prompt("Documents directory")
        .default(config.docs_dir.display().to_string())
        .interact_text()?;

    let index_path: String = Input::new()
        .with_prompt("Index path")
        .default(config.index_path.display().to_string())
        .interact_text()?;

    let chunk_size: usize = Input::new()
        .with_prompt("Chunk size (chars)")
        .default(config.chunking.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (100..=8000).contains(input) {
                Ok(())
            } else {
                Err("Chunk size must be between 100 and 8000")
            }
        })
        .interact_text()?;

    let default_overlap = config
        .chunking
        .chunk_overlap
        .min(chunk_size.saturating_sub(1));
    let chunk_overlap: usize = Input::new()
        .with_prompt("Chunk overlap (chars)")
        .default(default_overlap)
        .validate_with(|input: &usize| -> Result<(), ConfigError> {
            validate_chunking(ChunkingConfig {
                chunk_size,
                chunk_overlap: *input,
            })
        })
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Passages retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), ConfigError> {
            RetrievalConfig { top_k: *input }.validate()
        })
        .interact_text()?;

    config.docs_dir = docs_dir.into();
    config.index_path = index_path.into();
    config.set_chunking(chunk_size, chunk_overlap)?;
    config.retrieval.set_top_k(top_k)?;

    Ok(())
}

fn validate_chunking(chunking: ChunkingConfig) -> Result<(), ConfigError> {
    let mut candidate = Config::default();
    candidate.set_chunking(chunking.chunk_size, chunking.chunk_overlap)
}

/// Ask the service for its model list, which exercises URL, credential and models
fn test_service_connection(service: &ServiceConfig) -> Result<()> {
    let client = OpenAiClient::new(service)?.with_timeout(CONNECTION_TEST_TIMEOUT);
    client.health_check()
}

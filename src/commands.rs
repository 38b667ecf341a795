use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::{error, info, warn};

use crate::AssistantError;
use crate::chat::{self, ChatSession};
use crate::config::Config;
use crate::database::VectorStore;
use crate::documents::load_documents;
use crate::embeddings::OpenAiClient;
use crate::indexer::{IndexSummary, Indexer};
use crate::query::QueryEngine;

/// Load the settings file from the default configuration directory
#[inline]
pub fn load_config() -> crate::Result<Config> {
    Config::load_default().map_err(config_error)
}

/// Load the settings file from `config_dir`
#[inline]
pub fn load_config_from(config_dir: &Path) -> crate::Result<Config> {
    Config::load(config_dir).map_err(config_error)
}

fn config_error(e: anyhow::Error) -> AssistantError {
    AssistantError::Config(format!("{:#}", e))
}

fn build_client(config: &Config) -> Result<OpenAiClient> {
    OpenAiClient::new(&config.service).context("Failed to initialize service client")
}

/// Rebuild the index from the documents directory
#[inline]
pub async fn run_index(config: &Config) -> Result<IndexSummary> {
    let client = build_client(config)?;
    let indexer = Indexer::new(config.chunking, &client)
        .with_batch_size(config.service.batch_size as usize);

    match indexer
        .build_index(&config.docs_dir, &config.index_path)
        .await
    {
        Ok(summary) => Ok(summary),
        Err(e) => {
            error!("Indexing failed: {}", e);
            eprintln!("{} {}", style("Indexing failed:").red().bold(), e);
            Err(e.into())
        }
    }
}

/// Start the interactive chat against the persisted index
#[inline]
pub async fn run_chat(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let engine = QueryEngine::load(
        &config.index_path,
        &client,
        &client,
        config.retrieval.top_k,
    )
    .await;

    let mut session = ChatSession::new(engine);
    chat::run_chat(&mut session).await
}

/// Answer a single question on stdout. Returns whether an answer was produced.
#[inline]
pub async fn ask_question(config: &Config, question: &str) -> Result<bool> {
    let question = question.trim();
    if question.is_empty() {
        eprintln!("{}", style(chat::EMPTY_INPUT_WARNING).yellow());
        return Ok(false);
    }

    let client = build_client(config)?;
    let engine = QueryEngine::load(
        &config.index_path,
        &client,
        &client,
        config.retrieval.top_k,
    )
    .await;

    match engine.answer(question).await {
        Ok(answer) => {
            println!("{}", answer.text.trim());
            info!("Sources: {}", answer.sources.join(", "));
            Ok(true)
        }
        Err(e) => {
            println!("{}", e);
            Ok(false)
        }
    }
}

/// Show configuration, corpus, index and service health
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("{}", style("Enrolment Assistant Status").bold().cyan());
    println!();

    println!("{}", style("Configuration").bold().yellow());
    let config_path = config.config_file_path();
    if config_path.exists() {
        println!("  File: {}", style(config_path.display()).cyan());
    } else {
        println!(
            "  File: {} {}",
            style(config_path.display()).dim(),
            style("(not created, using defaults)").dim()
        );
    }
    println!();

    println!("{}", style("Documents").bold().yellow());
    println!("  Directory: {}", style(config.docs_dir.display()).cyan());
    match load_documents(&config.docs_dir) {
        Ok(documents) => {
            let blank = documents.iter().filter(|d| d.is_blank()).count();
            println!("  Text files: {}", documents.len());
            if blank > 0 {
                println!("  Blank files: {}", style(blank).yellow());
            }
        }
        Err(e) => println!("  {} {}", style("Unavailable:").red(), e),
    }
    println!();

    println!("{}", style("Index").bold().yellow());
    println!("  Path: {}", style(config.index_path.display()).cyan());
    match VectorStore::open(&config.index_path).await {
        Ok(store) => {
            let records = store
                .count_records()
                .await
                .map_or_else(|e| format!("unknown ({})", e), |n| n.to_string());
            println!("  Chunks: {}", records);
            println!("  Dimensions: {}", store.vector_dimension());
        }
        Err(e) => {
            warn!("Index not available: {}", e);
            println!("  {} {}", style("Not built:").red(), e);
            println!("  Run 'enrolment-assistant index' to build it.");
        }
    }
    println!();

    println!("{}", style("Service").bold().yellow());
    let client = build_client(config)?;
    println!("  Endpoint: {}", style(client.base_url()).cyan());
    match client.health_check() {
        Ok(()) => println!("  {}", style("✓ Reachable, models available").green()),
        Err(e) => println!("  {} {:#}", style("✗ Unhealthy:").red(), e),
    }

    Ok(())
}

// Deterministic service stand-ins shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use enrolment_assistant::embeddings::Embedder;
use enrolment_assistant::generation::Generator;

pub const DIMENSION: usize = 32;

/// Hashed bag-of-words embedder
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                    (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
                });
            vector[hash as usize % DIMENSION] += 1.0;
        }
        Ok(vector)
    }
}

/// Answers with the prompt it was given, so the context is visible in the reply
pub struct EchoGenerator;

impl Generator for EchoGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

pub struct FailingGenerator;

impl Generator for FailingGenerator {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("completion service unavailable"))
    }
}

/// Write `files` into `<root>/docs` and return that directory
pub fn write_docs(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    let docs = root.join("docs");
    fs::create_dir_all(&docs).expect("should create docs dir");
    for (name, text) in files {
        fs::write(docs.join(name), text).expect("should write document");
    }
    docs
}

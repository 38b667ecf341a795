// Deterministic stand-ins for the embedding and generation services

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};

use crate::embeddings::Embedder;
use crate::generation::Generator;

pub(crate) const TEST_DIMENSION: usize = 64;

/// Hashed bag-of-words embedder: texts sharing words land close together
#[derive(Debug, Default)]
pub(crate) struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; TEST_DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % TEST_DIMENSION;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Embedder whose service is always down
#[derive(Debug, Default)]
pub(crate) struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(anyhow!("connection refused"))
    }
}

/// Generator that answers with the prompt it was given
#[derive(Debug, Default)]
pub(crate) struct EchoGenerator;

impl Generator for EchoGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FailingGenerator;

impl Generator for FailingGenerator {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("service unavailable"))
    }
}

/// Generator that fails for one question and answers every other, counting all calls
#[derive(Debug)]
pub(crate) struct FlakyGenerator {
    failing_question: &'static str,
    calls: AtomicUsize,
}

impl FlakyGenerator {
    pub(crate) fn failing_on(failing_question: &'static str) -> Self {
        Self {
            failing_question,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for FlakyGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains(&format!("Question: {}\n", self.failing_question)) {
            Err(anyhow!("service unavailable"))
        } else {
            Ok("Enrol by March 1.".to_string())
        }
    }
}

/// Generator that records how often it was called
#[derive(Debug, Default)]
pub(crate) struct CountingGenerator {
    calls: AtomicUsize,
}

impl CountingGenerator {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for CountingGenerator {
    fn complete(&self, _prompt: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("Answer number {}", call))
    }
}

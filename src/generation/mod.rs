// Generation module
// Prompt construction and the language-model completion seam


use anyhow::Result;
use itertools::Itertools;

/// Produces a completion for a prompt
pub trait Generator {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<T: Generator + ?Sized> Generator for &T {
    #[inline]
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

const PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Stuff every retrieved passage into a single question-answering prompt
#[inline]
pub fn build_prompt<'a, I>(question: &str, passages: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let context = passages.into_iter().join("\n\n");

    format!(
        "{}\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        PROMPT_PREAMBLE, context, question
    )
}

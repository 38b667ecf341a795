use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use tracing::debug;

use super::{
    ChatSession, HEADER_SUBTITLE, HEADER_TITLE, INPUT_PLACEHOLDER, SubmitOutcome,
    render_transcript,
};
use crate::embeddings::Embedder;
use crate::generation::Generator;

/// Run the interactive chat until input is closed
#[inline]
pub async fn run_chat<E: Embedder, G: Generator>(session: &mut ChatSession<E, G>) -> Result<()> {
    let term = Term::stdout();
    let theme = ColorfulTheme::default();
    let mut warning: Option<&'static str> = None;

    session.greet();

    loop {
        draw_screen(&term, session, warning.take())?;

        let input: String = match Input::with_theme(&theme)
            .with_prompt(format!("Your question ({})", INPUT_PLACEHOLDER))
            .allow_empty(true)
            .interact_text_on(&term)
        {
            Ok(input) => input,
            Err(e) => {
                debug!("Input closed: {}", e);
                break;
            }
        };

        if !input.trim().is_empty() {
            term.write_line(&style("Thinking...").dim().to_string())
                .context("Failed to write to terminal")?;
        }

        match session.submit(&input).await {
            SubmitOutcome::Rejected { warning: message } => warning = Some(message),
            SubmitOutcome::Duplicate => debug!("Question repeated, nothing to do"),
            SubmitOutcome::Answered(answer) => {
                debug!("Answer drew on {} sources", answer.sources.len());
            }
            SubmitOutcome::Failed(e) => debug!("Question failed: {}", e),
        }
    }

    term.write_line("Goodbye!")
        .context("Failed to write to terminal")?;
    Ok(())
}

fn draw_screen<E: Embedder, G: Generator>(
    term: &Term,
    session: &ChatSession<E, G>,
    warning: Option<&str>,
) -> Result<()> {
    if term.is_term() {
        term.clear_screen().context("Failed to clear terminal")?;
    }

    let (_, columns) = term.size();

    term.write_line(&style(HEADER_TITLE).bold().cyan().to_string())?;
    term.write_line(&style(HEADER_SUBTITLE).dim().to_string())?;
    term.write_line("")?;

    if let Some(error) = session.engine().load_error() {
        term.write_line(
            &style(format!("Error loading knowledge base: {}", error))
                .red()
                .to_string(),
        )?;
        term.write_line("")?;
    }

    for line in render_transcript(session.transcript().entries(), usize::from(columns)) {
        term.write_line(&line)?;
    }

    if let Some(warning) = warning {
        term.write_line(&style(warning).yellow().to_string())?;
    }

    Ok(())
}

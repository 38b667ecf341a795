// Chat front end
// Session state, transcript and the rules for accepting a question

pub mod render;
pub mod terminal;


use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::query::{Answer, AnswerError, QueryEngine};

pub use render::render_transcript;
pub use terminal::run_chat;

pub const GREETING: &str =
    "Hello! How can I assist you with your RMIT course enrolment or other university matters today?";
pub const EMPTY_INPUT_WARNING: &str = "Please enter a question.";
pub const HEADER_TITLE: &str = "Welcome to the RMIT Course Enrolment Chatbot";
pub const HEADER_SUBTITLE: &str =
    "Your personal guide to course enrolment, career advice, and more at RMIT University.";
pub const INPUT_PLACEHOLDER: &str = "e.g., How do I enrol in COSC1111?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl TranscriptEntry {
    #[inline]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

/// Append-only conversation history, oldest first
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    #[inline]
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    #[inline]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Greeted,
    AwaitingInput,
    Processing,
}

/// What happened to a submitted line
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing to ask; the warning should be shown until the next submit
    Rejected { warning: &'static str },
    /// Same as the previous question; ignored
    Duplicate,
    Answered(Answer),
    Failed(AnswerError),
}

pub struct ChatSession<E: Embedder, G: Generator> {
    engine: QueryEngine<E, G>,
    transcript: Transcript,
    last_question: Option<String>,
    state: SessionState,
}

impl<E: Embedder, G: Generator> ChatSession<E, G> {
    #[inline]
    pub fn new(engine: QueryEngine<E, G>) -> Self {
        Self {
            engine,
            transcript: Transcript::default(),
            last_question: None,
            state: SessionState::Empty,
        }
    }

    /// Seed an empty transcript with the assistant's greeting
    #[inline]
    pub fn greet(&mut self) {
        if self.transcript.is_empty() {
            self.transcript
                .push(TranscriptEntry::new(Role::Assistant, GREETING));
            self.state = SessionState::Greeted;
        }
    }

    /// Handle one line of user input.
    ///
    /// Blank input and a repeat of the immediately preceding question never
    /// reach the query engine and leave the transcript untouched, whether or
    /// not that question was answered.
    #[inline]
    pub async fn submit(&mut self, input: &str) -> SubmitOutcome {
        let question = input.trim();

        if question.is_empty() {
            debug!("Rejected empty input");
            return SubmitOutcome::Rejected {
                warning: EMPTY_INPUT_WARNING,
            };
        }

        if self.last_question.as_deref() == Some(question) {
            debug!("Ignoring repeated question");
            return SubmitOutcome::Duplicate;
        }

        self.transcript
            .push(TranscriptEntry::new(Role::User, question));
        self.last_question = Some(question.to_string());
        self.state = SessionState::Processing;
        info!("Answering question ({} chars)", question.len());

        let outcome = match self.engine.answer(question).await {
            Ok(answer) => {
                self.transcript
                    .push(TranscriptEntry::new(Role::Assistant, answer.text.clone()));
                SubmitOutcome::Answered(answer)
            }
            Err(e) => {
                self.transcript
                    .push(TranscriptEntry::new(Role::Assistant, e.to_string()));
                SubmitOutcome::Failed(e)
            }
        };

        self.state = SessionState::AwaitingInput;
        outcome
    }

    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn engine(&self) -> &QueryEngine<E, G> {
        &self.engine
    }

    #[inline]
    pub fn last_question(&self) -> Option<&str> {
        self.last_question.as_deref()
    }
}

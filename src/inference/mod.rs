//! Inference dispatch: route document text to one of three backends.
//!
//! ```text
//!                         ┌─▶ Summarizer        (first 1024 chars)
//! document ─▶ Assistant ──┼─▶ QuestionAnswerer  (first 512 chars + question)
//!                         └─▶ ChatBackend       (template + first 2000 chars)
//! ```
//!
//! The three backends are independent: each call is sent exactly once, with
//! no caching, retry, or fallback, and each fails with its own
//! [`AssistantError`]. The truncation limits are fixed constants; they are
//! not configurable.
//!
//! Backends are trait objects so tests (and library users) can swap in
//! their own implementations through [`Assistant::with_backends`].

pub mod chat;
pub mod huggingface;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::prompts::AnalysisKind;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub use chat::LlmChatBackend;
pub use huggingface::{HuggingFaceQa, HuggingFaceSummarizer};

/// Characters of document text sent to the summariser.
pub const SUMMARY_INPUT_CHARS: usize = 1024;

/// Characters of document text used as QA context.
pub const QA_CONTEXT_CHARS: usize = 512;

/// Characters of document text appended to a GPT prompt.
pub const GPT_DOCUMENT_CHARS: usize = 2000;

/// Return the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, not bytes, and never splits a character.
/// The cut is not sentence-aware.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ── Backend seams ────────────────────────────────────────────────────────

/// Length bounds passed to the summariser, in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryBounds {
    pub max_length: usize,
    pub min_length: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            max_length: 150,
            min_length: 30,
        }
    }
}

impl SummaryBounds {
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            max_length: config.summary_max_length,
            min_length: config.summary_min_length,
        }
    }
}

/// Abstractive summarisation backend.
pub trait Summarizer: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Summarise `text`, returning the first generated summary.
    fn summarize<'a>(
        &'a self,
        text: &'a str,
        bounds: SummaryBounds,
    ) -> BoxFuture<'a, Result<String, AssistantError>>;
}

/// Extractive question-answering backend.
pub trait QuestionAnswerer: Send + Sync {
    fn name(&self) -> &str;

    /// Return the answer span selected from `context`.
    fn answer<'a>(
        &'a self,
        question: &'a str,
        context: &'a str,
    ) -> BoxFuture<'a, Result<String, AssistantError>>;
}

/// A chat-completion reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Single-turn chat-completion backend.
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Send `prompt` as the only user message.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<ChatReply, AssistantError>>;
}

// ── Requests & results ───────────────────────────────────────────────────

/// Which backend a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Summarize,
    Qa,
    Gpt,
}

/// A request with its payload already truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum InferenceRequest {
    Summarize {
        text: String,
    },
    #[serde(rename = "qa")]
    Answer {
        question: String,
        context: String,
    },
    #[serde(rename = "gpt")]
    Analyze {
        kind: AnalysisKind,
        prompt: String,
    },
}

impl InferenceRequest {
    /// Summarisation request over the first [`SUMMARY_INPUT_CHARS`] characters.
    pub fn summarize(document: &str) -> Self {
        InferenceRequest::Summarize {
            text: truncate_chars(document, SUMMARY_INPUT_CHARS).to_string(),
        }
    }

    /// QA request over the first [`QA_CONTEXT_CHARS`] characters.
    ///
    /// A blank question is rejected here so it never reaches a backend.
    pub fn answer(question: &str, document: &str) -> Result<Self, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }
        Ok(InferenceRequest::Answer {
            question: question.to_string(),
            context: truncate_chars(document, QA_CONTEXT_CHARS).to_string(),
        })
    }

    /// GPT analysis request: template plus the first [`GPT_DOCUMENT_CHARS`] characters.
    pub fn analyze(kind: AnalysisKind, document: &str) -> Self {
        let prompt = kind.build_prompt(truncate_chars(document, GPT_DOCUMENT_CHARS));
        InferenceRequest::Analyze { kind, prompt }
    }

    pub fn mode(&self) -> Mode {
        match self {
            InferenceRequest::Summarize { .. } => Mode::Summarize,
            InferenceRequest::Answer { .. } => Mode::Qa,
            InferenceRequest::Analyze { .. } => Mode::Gpt,
        }
    }
}

/// A GPT analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub kind: AnalysisKind,
    /// The model's reply, unmodified.
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Result of [`Assistant::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "result", rename_all = "lowercase")]
pub enum InferenceOutput {
    Summarize(String),
    #[serde(rename = "qa")]
    Answer(String),
    #[serde(rename = "gpt")]
    Analysis(Analysis),
}

impl InferenceOutput {
    /// The text to show the user.
    pub fn text(&self) -> &str {
        match self {
            InferenceOutput::Summarize(s) | InferenceOutput::Answer(s) => s,
            InferenceOutput::Analysis(a) => &a.text,
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────

/// Holds one handle per backend and dispatches requests to them.
#[derive(Clone)]
pub struct Assistant {
    summarizer: Arc<dyn Summarizer>,
    answerer: Arc<dyn QuestionAnswerer>,
    chat: Arc<dyn ChatBackend>,
    bounds: SummaryBounds,
}

impl Assistant {
    /// Build the production backends from the configuration.
    ///
    /// The two Hugging Face backends share one HTTP client. The chat backend
    /// resolves its provider on every call, so a missing API key only
    /// surfaces when GPT analysis is attempted.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = huggingface::build_client()?;
        Ok(Self {
            summarizer: Arc::new(HuggingFaceSummarizer::new(client.clone(), config)),
            answerer: Arc::new(HuggingFaceQa::new(client, config)),
            chat: Arc::new(LlmChatBackend::new(config)),
            bounds: SummaryBounds::from_config(config),
        })
    }

    /// Assemble an assistant from caller-supplied backends.
    pub fn with_backends(
        summarizer: Arc<dyn Summarizer>,
        answerer: Arc<dyn QuestionAnswerer>,
        chat: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            summarizer,
            answerer,
            chat,
            bounds: SummaryBounds::default(),
        }
    }

    pub fn with_summary_bounds(mut self, bounds: SummaryBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn summary_bounds(&self) -> SummaryBounds {
        self.bounds
    }

    /// Summarise the beginning of `document`.
    pub async fn summarize(&self, document: &str) -> Result<String, AssistantError> {
        let text = truncate_chars(document, SUMMARY_INPUT_CHARS);
        info!(
            "Summarizing {} chars with {}",
            text.chars().count(),
            self.summarizer.name()
        );
        self.summarizer.summarize(text, self.bounds).await
    }

    /// Answer `question` from the beginning of `document`.
    pub async fn answer(&self, question: &str, document: &str) -> Result<String, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }
        let context = truncate_chars(document, QA_CONTEXT_CHARS);
        info!("Answering question with {}", self.answerer.name());
        self.answerer.answer(question, context).await
    }

    /// Run a GPT analysis over the beginning of `document`.
    pub async fn analyze(
        &self,
        kind: &AnalysisKind,
        document: &str,
    ) -> Result<Analysis, AssistantError> {
        let prompt = kind.build_prompt(truncate_chars(document, GPT_DOCUMENT_CHARS));
        self.complete(kind.clone(), &prompt).await
    }

    /// Dispatch a pre-built request.
    pub async fn run(&self, request: &InferenceRequest) -> Result<InferenceOutput, AssistantError> {
        debug!("Dispatching {:?} request", request.mode());
        match request {
            InferenceRequest::Summarize { text } => self
                .summarizer
                .summarize(truncate_chars(text, SUMMARY_INPUT_CHARS), self.bounds)
                .await
                .map(InferenceOutput::Summarize),
            InferenceRequest::Answer { question, context } => self
                .answer(question, context)
                .await
                .map(InferenceOutput::Answer),
            InferenceRequest::Analyze { kind, prompt } => self
                .complete(kind.clone(), prompt)
                .await
                .map(InferenceOutput::Analysis),
        }
    }

    async fn complete(&self, kind: AnalysisKind, prompt: &str) -> Result<Analysis, AssistantError> {
        info!("Running '{}' analysis with {}", kind, self.chat.name());
        let reply = self.chat.complete(prompt).await?;
        debug!(
            "Analysis: {} prompt tokens, {} completion tokens",
            reply.prompt_tokens, reply.completion_tokens
        );
        Ok(Analysis {
            kind,
            text: reply.content,
            prompt_tokens: reply.prompt_tokens,
            completion_tokens: reply.completion_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn summarize_request_truncates_to_1024() {
        let doc = "x".repeat(5000);
        match InferenceRequest::summarize(&doc) {
            InferenceRequest::Summarize { text } => assert_eq!(text.len(), 1024),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn answer_request_truncates_context_to_512() {
        let doc = "y".repeat(800);
        let req = InferenceRequest::answer(" What? ", &doc).unwrap();
        assert_eq!(req.mode(), Mode::Qa);
        match req {
            InferenceRequest::Answer { question, context } => {
                assert_eq!(question, "What?");
                assert_eq!(context.chars().count(), 512);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn blank_question_rejected() {
        let err = InferenceRequest::answer("   ", "doc").unwrap_err();
        assert!(matches!(err, AssistantError::EmptyQuestion));
    }

    #[test]
    fn analyze_request_uses_first_2000_chars() {
        let doc = format!("{}{}", "a".repeat(2000), "TAIL");
        let req = InferenceRequest::analyze(AnalysisKind::Summarize, &doc);
        assert_eq!(req.mode(), Mode::Gpt);
        match req {
            InferenceRequest::Analyze { prompt, .. } => {
                assert!(!prompt.contains("TAIL"));
                assert!(prompt.starts_with("Summarize this document concisely:\n\n"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn request_serialises_with_mode_tag() {
        let req = InferenceRequest::answer("Who?", "Alice wrote it.").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mode"], "qa");
        assert_eq!(json["question"], "Who?");
    }

    // Minimal recording backends; the integration tests have richer mocks.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Summarizer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn summarize<'a>(
            &'a self,
            text: &'a str,
            bounds: SummaryBounds,
        ) -> BoxFuture<'a, Result<String, AssistantError>> {
            self.0
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", bounds.min_length, bounds.max_length, text.len()));
            Box::pin(async { Ok::<_, AssistantError>("summary".to_string()) })
        }
    }

    impl QuestionAnswerer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn answer<'a>(
            &'a self,
            question: &'a str,
            context: &'a str,
        ) -> BoxFuture<'a, Result<String, AssistantError>> {
            self.0.lock().unwrap().push(format!("{question}|{context}"));
            Box::pin(async { Ok::<_, AssistantError>("span".to_string()) })
        }
    }

    impl ChatBackend for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn complete<'a>(
            &'a self,
            prompt: &'a str,
        ) -> BoxFuture<'a, Result<ChatReply, AssistantError>> {
            self.0.lock().unwrap().push(prompt.to_string());
            Box::pin(async {
                Ok::<_, AssistantError>(ChatReply {
                    content: "```markdown\n- point\n```".to_string(),
                    prompt_tokens: 12,
                    completion_tokens: 3,
                })
            })
        }
    }

    fn assistant(rec: &Arc<Recorder>) -> Assistant {
        Assistant::with_backends(rec.clone(), rec.clone(), rec.clone())
    }

    #[tokio::test]
    async fn summarize_passes_default_bounds() {
        let rec = Arc::new(Recorder::default());
        let out = assistant(&rec).summarize(&"z".repeat(3000)).await.unwrap();
        assert_eq!(out, "summary");
        assert_eq!(rec.0.lock().unwrap().as_slice(), ["30:150:1024"]);
    }

    #[tokio::test]
    async fn run_dispatches_by_mode() {
        let rec = Arc::new(Recorder::default());
        let a = assistant(&rec);

        let out = a
            .run(&InferenceRequest::answer("Who?", "Alice wrote it.").unwrap())
            .await
            .unwrap();
        assert_eq!(out, InferenceOutput::Answer("span".into()));

        let out = a
            .run(&InferenceRequest::analyze(AnalysisKind::KeyPoints, "ABC"))
            .await
            .unwrap();
        match out {
            InferenceOutput::Analysis(analysis) => {
                assert_eq!(analysis.text, "```markdown\n- point\n```");
                assert_eq!(analysis.prompt_tokens, 12);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let calls = rec.0.lock().unwrap();
        assert_eq!(calls[0], "Who?|Alice wrote it.");
        assert_eq!(calls[1], "List the key points from this document:\n\nABC");
    }

    #[tokio::test]
    async fn analysis_keeps_reply_verbatim() {
        let rec = Arc::new(Recorder::default());
        let analysis = assistant(&rec)
            .analyze(&AnalysisKind::KeyPoints, "ABC")
            .await
            .unwrap();
        assert_eq!(analysis.kind, AnalysisKind::KeyPoints);
        assert_eq!(analysis.text, "```markdown\n- point\n```");
        assert_eq!(analysis.completion_tokens, 3);
    }

    #[tokio::test]
    async fn empty_question_never_reaches_backend() {
        let rec = Arc::new(Recorder::default());
        let err = assistant(&rec).answer("", "context").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyQuestion));
        assert!(rec.0.lock().unwrap().is_empty());
    }
}

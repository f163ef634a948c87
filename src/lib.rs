//! # edgequake-pdfqa
//!
//! Ask questions about a PDF, summarise it, or run a free-form analysis of it
//! with a chat model.
//!
//! The crate extracts the text layer of a PDF (an uploaded file, a URL, or a
//! local path) with pdfium and routes the beginning of that text to one of
//! three hosted backends. PDF parsing and model inference are delegated; what
//! lives here is the orchestration and the error handling around it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload / URL / path
//!  │
//!  ├─ 1. Acquire   bytes in memory, or a checked local path
//!  ├─ 2. Extract   page text via pdfium (spawn_blocking), concatenated
//!  ├─ 3. Dispatch  one of:
//!  │      summarize  first 1024 chars ─▶ HF summarisation (150/30 tokens)
//!  │      ask        first  512 chars ─▶ HF extractive QA
//!  │      analyze    template + first 2000 chars ─▶ chat model
//!  └─ 4. Present   one result per action, errors shown inline
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfqa::{AnalysisKind, AssistantConfig, DocumentSource, Session};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GPT analysis needs an OpenAI key; HF_TOKEN is optional.
//!     let config = AssistantConfig::builder()
//!         .openai_api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
//!         .hf_token(std::env::var("HF_TOKEN").unwrap_or_default())
//!         .build()?;
//!     let mut session = Session::from_config(config)?;
//!
//!     session.load(DocumentSource::parse("paper.pdf")?).await?;
//!     println!("{}", session.summarize().await?);
//!     println!("{}", session.ask("What dataset was used?").await?);
//!     println!("{}", session.analyze(&AnalysisKind::KeyPoints).await?.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfqa` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfqa = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod command;
pub mod config;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use command::{Command, CommandError};
pub use config::{
    AssistantConfig, AssistantConfigBuilder, CredentialReport, CredentialStatus, SampleDocument,
};
pub use error::{AssistantError, ErrorKind};
pub use inference::{
    Analysis, Assistant, ChatBackend, ChatReply, InferenceOutput, InferenceRequest, Mode,
    QuestionAnswerer, Summarizer, SummaryBounds,
};
pub use pipeline::extract::{extract_file, extract_text, ExtractedText, PdfTextExtractor, PdfiumExtractor};
pub use pipeline::input::{acquire, is_url, read_upload, AcquiredPdf, DocumentSource, PdfInput};
pub use pipeline::postprocess::clean_response;
pub use prompts::AnalysisKind;
pub use session::{Document, Session, SessionState};

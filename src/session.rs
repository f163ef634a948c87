//! The two-state document session.
//!
//! A [`Session`] is either empty or holds exactly one loaded document. A
//! new load replaces the old document: the state is cleared first and only
//! moves to [`SessionState::Loaded`] when acquisition and extraction both
//! succeed. Inference actions read the loaded text and never change state.
//!
//! ```text
//!            load ok                     load ok
//! NoDocument ───────▶ Loaded(doc) ─────────────▶ Loaded(doc')
//!     ▲                   │
//!     └──── load fails ───┘
//! ```

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::inference::{Analysis, Assistant};
use crate::pipeline::extract::{extract_text, ExtractedText, PdfTextExtractor, PdfiumExtractor};
use crate::pipeline::input::{acquire, DocumentSource};
use crate::prompts::AnalysisKind;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A document whose text has been extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Concatenated page text, unmodified.
    pub text: String,
    /// Where the document came from (file name, URL, or path).
    pub source: String,
    pub page_count: usize,
}

impl Document {
    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Which of the two session states we are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    NoDocument,
    Loaded(&'a Document),
}

/// Holds the current document and the backends that act on it.
pub struct Session {
    config: AssistantConfig,
    assistant: Assistant,
    extractor: Arc<dyn PdfTextExtractor>,
    document: Option<Document>,
}

impl Session {
    pub fn new(
        config: AssistantConfig,
        assistant: Assistant,
        extractor: Arc<dyn PdfTextExtractor>,
    ) -> Self {
        Self {
            config,
            assistant,
            extractor,
            document: None,
        }
    }

    /// A session with the production backends and the pdfium extractor.
    pub fn from_config(config: AssistantConfig) -> Result<Self, AssistantError> {
        let assistant = Assistant::from_config(&config)?;
        Ok(Self::new(config, assistant, Arc::new(PdfiumExtractor::new())))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState<'_> {
        match &self.document {
            Some(doc) => SessionState::Loaded(doc),
            None => SessionState::NoDocument,
        }
    }

    /// The loaded document, if any.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Drop the loaded document.
    pub fn clear(&mut self) {
        self.document = None;
    }

    /// Acquire and extract a document, replacing whatever was loaded.
    ///
    /// On failure the session is left in [`SessionState::NoDocument`]; the
    /// previous document is not restored.
    pub async fn load(&mut self, source: DocumentSource) -> Result<&Document, AssistantError> {
        self.clear();
        let start = Instant::now();
        let label = source.label();
        info!("Loading document: {}", label);

        let acquired = acquire(&source, &self.config).await?;
        let ExtractedText { text, page_count } = extract_text(
            Arc::clone(&self.extractor),
            acquired.input,
            acquired.label.clone(),
            self.config.password.clone(),
        )
        .await
        .inspect_err(|e| warn!("Extraction failed for {}: {}", label, e))?;

        info!(
            "Loaded {} ({} pages) in {:?}",
            acquired.label,
            page_count,
            start.elapsed()
        );
        Ok(self.document.insert(Document {
            text,
            source: acquired.label,
            page_count,
        }))
    }

    /// Load one of the configured sample documents by name.
    pub async fn load_sample(&mut self, name: &str) -> Result<&Document, AssistantError> {
        let source = self
            .config
            .sample(name)
            .map(|s| s.source())
            .ok_or_else(|| AssistantError::UnknownSample {
                name: name.trim().to_string(),
            })?;
        self.load(source).await
    }

    /// Summarise the loaded document.
    pub async fn summarize(&self) -> Result<String, AssistantError> {
        let doc = self.require_document()?;
        self.assistant.summarize(&doc.text).await
    }

    /// Answer a question about the loaded document.
    pub async fn ask(&self, question: &str) -> Result<String, AssistantError> {
        let doc = self.require_document()?;
        self.assistant.answer(question, &doc.text).await
    }

    /// Run a GPT analysis over the loaded document.
    pub async fn analyze(&self, kind: &AnalysisKind) -> Result<Analysis, AssistantError> {
        let doc = self.require_document()?;
        self.assistant.analyze(kind, &doc.text).await
    }

    fn require_document(&self) -> Result<&Document, AssistantError> {
        self.document().ok_or(AssistantError::NoDocumentLoaded)
    }
}

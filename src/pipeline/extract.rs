//! Text extraction: open a PDF and concatenate the text of every page.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and is not async-safe.
//! [`extract_text`] moves the extractor call onto tokio's blocking pool and
//! awaits it straight away, so the caller still sees one sequential step.
//!
//! The [`PdfTextExtractor`] trait is the seam between page reading and
//! page assembly: [`PdfiumExtractor`] is the real implementation, tests plug
//! in a fake that returns canned page strings.

use crate::error::AssistantError;
use crate::pipeline::input::PdfInput;
use pdfium_render::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reads the text layer of each page of a PDF.
pub trait PdfTextExtractor: Send + Sync {
    /// Return one string per page, in page order.
    ///
    /// A page whose text cannot be read yields `""`. A document that cannot
    /// be opened fails the whole call.
    fn page_texts(
        &self,
        input: &PdfInput,
        password: Option<&str>,
    ) -> Result<Vec<String>, AssistantError>;
}

/// Text extracted from a whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

/// Extract and concatenate page text.
///
/// Pages are joined with no separator and no normalisation. A document with
/// no text at all (after trimming) is reported as
/// [`AssistantError::NoExtractableText`] so callers can tell it apart from a
/// document that failed to open.
pub async fn extract_text(
    extractor: Arc<dyn PdfTextExtractor>,
    input: PdfInput,
    source_name: String,
    password: Option<String>,
) -> Result<ExtractedText, AssistantError> {
    if let PdfInput::Bytes(ref bytes) = input {
        check_magic(bytes, &source_name)?;
    }

    let pages = tokio::task::spawn_blocking(move || {
        extractor.page_texts(&input, password.as_deref())
    })
    .await
    .map_err(|e| AssistantError::Internal(format!("Extraction task panicked: {}", e)))??;

    let page_count = pages.len();
    let text = concat_pages(pages);
    if text.trim().is_empty() {
        return Err(AssistantError::NoExtractableText {
            source_name,
            pages: page_count,
        });
    }

    info!(
        "Extracted {} characters from {} pages",
        text.chars().count(),
        page_count
    );
    Ok(ExtractedText { text, page_count })
}

/// Join page strings in order.
pub fn concat_pages(pages: Vec<String>) -> String {
    let mut text = String::with_capacity(pages.iter().map(String::len).sum());
    for page in pages {
        text.push_str(&page);
    }
    text
}

fn check_magic(bytes: &[u8], source_name: &str) -> Result<(), AssistantError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(AssistantError::NotAPdf {
            source_name: source_name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`PdfTextExtractor`] backed by the pdfium library.
///
/// Binding order: `PDFIUM_LIB_PATH`, then a library next to the working
/// directory, then the system library. A fresh binding is created per
/// document.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumExtractor;

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn bind_pdfium() -> Result<Pdfium, AssistantError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| AssistantError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

impl PdfTextExtractor for PdfiumExtractor {
    fn page_texts(
        &self,
        input: &PdfInput,
        password: Option<&str>,
    ) -> Result<Vec<String>, AssistantError> {
        let pdfium = bind_pdfium()?;
        let source_name = match input {
            PdfInput::Path(p) => p.display().to_string(),
            PdfInput::Bytes(_) => "<upload>".to_string(),
        };

        let document = match input {
            PdfInput::Path(p) => pdfium.load_pdf_from_file(p.as_path(), password),
            PdfInput::Bytes(b) => pdfium.load_pdf_from_byte_slice(b, password),
        }
        .map_err(|e| classify_load_error(e, &source_name, password.is_some()))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        debug!("PDF loaded: {} pages", total);

        let mut texts = Vec::with_capacity(total);
        for (idx, page) in pages.iter().enumerate() {
            let text = match page.text() {
                Ok(t) => t.all(),
                Err(e) => {
                    warn!("Page {}: no readable text layer ({:?})", idx + 1, e);
                    String::new()
                }
            };
            texts.push(text);
        }

        Ok(texts)
    }
}

fn classify_load_error(e: PdfiumError, source_name: &str, had_password: bool) -> AssistantError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            AssistantError::WrongPassword {
                source_name: source_name.to_string(),
            }
        } else {
            AssistantError::PasswordRequired {
                source_name: source_name.to_string(),
            }
        }
    } else {
        AssistantError::CorruptPdf {
            source_name: source_name.to_string(),
            detail: err_str,
        }
    }
}

/// Convenience wrapper: extract a local file with pdfium.
pub async fn extract_file(
    path: &Path,
    password: Option<&str>,
) -> Result<ExtractedText, AssistantError> {
    extract_text(
        Arc::new(PdfiumExtractor::new()),
        PdfInput::Path(path.to_path_buf()),
        path.display().to_string(),
        password.map(str::to_string),
    )
    .await
}

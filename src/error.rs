//! Error types for the edgequake-pdfqa library.
//!
//! Every fallible operation returns [`AssistantError`]. Each variant belongs
//! to exactly one [`ErrorKind`], which tells the presentation layer which
//! stage failed:
//!
//! * **Acquisition**: the PDF bytes could not be obtained (missing file,
//!   HTTP error, download timeout).
//! * **Extraction**: the bytes were obtained but no text came out of them.
//! * **Inference**: a summarisation, QA, or chat backend failed.
//! * **Session**: the action is not allowed in the current session state.
//! * **Config**: the configuration was rejected at startup.
//!
//! None of these are fatal to an interactive session: the caller renders the
//! message and the loop carries on.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The stage an [`AssistantError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Acquisition,
    Extraction,
    Inference,
    Session,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Acquisition => "acquisition",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Inference => "inference",
            ErrorKind::Session => "session",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// All errors returned by the edgequake-pdfqa library.
#[derive(Debug, Error)]
pub enum AssistantError {
    // ── Acquisition errors ────────────────────────────────────────────────
    /// Local file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a usable path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// Network-level failure while downloading.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// Server answered with a non-success status.
    #[error("Failed to download '{url}': HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// No sample document is registered under this name.
    #[error("Unknown sample '{name}'. Run `sample` to list the configured documents.")]
    UnknownSample { name: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The bytes do not start with the `%PDF` signature.
    #[error("'{source_name}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    /// pdfium could not open the document.
    #[error("PDF '{source_name}' could not be read: {detail}")]
    CorruptPdf { source_name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{source_name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { source_name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{source_name}'")]
    WrongPassword { source_name: String },

    /// The document opened fine but contains no text layer.
    #[error("No text could be extracted from '{source_name}' ({pages} pages). Scanned PDFs need OCR first.")]
    NoExtractableText { source_name: String, pages: usize },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Inference errors ──────────────────────────────────────────────────
    /// QA was requested with a blank question.
    #[error("Question is empty")]
    EmptyQuestion,

    /// The chat provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Backend rejected the credentials (401/403).
    #[error("Authentication error from '{backend}': {detail}")]
    AuthError { backend: String, detail: String },

    /// Backend returned HTTP 429.
    #[error("Rate limit exceeded for '{backend}'")]
    RateLimitExceeded {
        backend: String,
        retry_after_secs: Option<u64>,
    },

    /// Backend answered with another non-success status.
    #[error("'{backend}' returned HTTP {status}: {message}")]
    BackendStatus {
        backend: String,
        status: u16,
        message: String,
    },

    /// Backend could not be reached at all.
    #[error("'{backend}' is unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    /// Backend answered 2xx but the body was not what we expected.
    #[error("Unexpected response from '{backend}': {detail}")]
    MalformedResponse { backend: String, detail: String },

    /// The chat provider returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// An inference action was attempted before a document was loaded.
    #[error("No document loaded. Use `load <path|url>` or `upload <file>` first.")]
    NoDocumentLoaded,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssistantError {
    /// The stage this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use AssistantError::*;
        match self {
            FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidInput { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. }
            | HttpStatus { .. }
            | UnknownSample { .. } => ErrorKind::Acquisition,

            NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordRequired { .. }
            | WrongPassword { .. }
            | NoExtractableText { .. }
            | PdfiumBindingFailed(_) => ErrorKind::Extraction,

            EmptyQuestion
            | ProviderNotConfigured { .. }
            | AuthError { .. }
            | RateLimitExceeded { .. }
            | BackendStatus { .. }
            | BackendUnavailable { .. }
            | MalformedResponse { .. }
            | LlmApiError { .. } => ErrorKind::Inference,

            NoDocumentLoaded => ErrorKind::Session,
            InvalidConfig(_) => ErrorKind::Config,
            Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_is_acquisition() {
        let e = AssistantError::FileNotFound {
            path: PathBuf::from("sample.pdf"),
        };
        assert_eq!(e.kind(), ErrorKind::Acquisition);
        assert!(e.to_string().contains("File not found"), "got: {e}");
        assert!(e.to_string().contains("sample.pdf"));
    }

    #[test]
    fn http_status_display() {
        let e = AssistantError::HttpStatus {
            url: "https://example.org/a.pdf".into(),
            status: 404,
        };
        assert!(e.to_string().contains("HTTP 404"));
        assert_eq!(e.kind(), ErrorKind::Acquisition);
    }

    #[test]
    fn empty_text_is_extraction_not_acquisition() {
        let e = AssistantError::NoExtractableText {
            source_name: "scan.pdf".into(),
            pages: 3,
        };
        assert_eq!(e.kind(), ErrorKind::Extraction);
        assert!(e.to_string().contains("3 pages"));
    }

    #[test]
    fn rate_limit_display() {
        let e = AssistantError::RateLimitExceeded {
            backend: "huggingface".into(),
            retry_after_secs: Some(20),
        };
        assert!(e.to_string().contains("huggingface"));
        assert_eq!(e.kind(), ErrorKind::Inference);
    }

    #[test]
    fn auth_error_display() {
        let e = AssistantError::AuthError {
            backend: "openai".into(),
            detail: "invalid key".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn session_and_config_kinds() {
        assert_eq!(AssistantError::NoDocumentLoaded.kind(), ErrorKind::Session);
        assert_eq!(
            AssistantError::InvalidConfig("x".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(ErrorKind::Inference.to_string(), "inference");
    }
}

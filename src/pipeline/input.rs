//! Source acquisition: turn an upload, URL, or local path into PDF input.
//!
//! Downloads stay in memory; pdfium opens byte slices directly, so there is
//! no temp file to manage. Local paths are handed to the extractor as paths
//! after an existence check. Nothing here checks that the bytes are a PDF;
//! the extractor does that.

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where a document comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Bytes already in memory (file upload, stdin).
    Upload { name: String, bytes: Vec<u8> },
    /// HTTP/HTTPS URL.
    Url(String),
    /// Path on the local filesystem.
    LocalPath(PathBuf),
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Upload { name, bytes } => f
                .debug_struct("Upload")
                .field("name", name)
                .field("bytes", &bytes.len())
                .finish(),
            DocumentSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            DocumentSource::LocalPath(p) => f.debug_tuple("LocalPath").field(p).finish(),
        }
    }
}

impl DocumentSource {
    /// Classify a user-supplied string as a URL or a local path.
    pub fn parse(input: &str) -> Result<Self, AssistantError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AssistantError::InvalidInput {
                input: input.to_string(),
            });
        }
        if is_url(input) {
            return Ok(DocumentSource::Url(input.to_string()));
        }
        if input.contains("://") {
            // ftp://, file://, … are not supported.
            return Err(AssistantError::InvalidInput {
                input: input.to_string(),
            });
        }
        Ok(DocumentSource::LocalPath(PathBuf::from(input)))
    }

    /// Human-readable name used in messages and errors.
    pub fn label(&self) -> String {
        match self {
            DocumentSource::Upload { name, .. } => name.clone(),
            DocumentSource::Url(url) => url.clone(),
            DocumentSource::LocalPath(p) => p.display().to_string(),
        }
    }
}

/// What the extractor opens.
#[derive(Clone, PartialEq, Eq)]
pub enum PdfInput {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl fmt::Debug for PdfInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfInput::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            PdfInput::Path(p) => f.debug_tuple("Path").field(p).finish(),
        }
    }
}

/// Output of [`acquire`].
#[derive(Debug, Clone)]
pub struct AcquiredPdf {
    pub input: PdfInput,
    pub label: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Obtain PDF input from a source. No retries.
pub async fn acquire(
    source: &DocumentSource,
    config: &AssistantConfig,
) -> Result<AcquiredPdf, AssistantError> {
    match source {
        DocumentSource::Upload { name, bytes } => {
            debug!("Using uploaded document '{}' ({} bytes)", name, bytes.len());
            Ok(AcquiredPdf {
                input: PdfInput::Bytes(bytes.clone()),
                label: name.clone(),
            })
        }
        DocumentSource::Url(url) => {
            let bytes = download_url(url, config.download_timeout_secs).await?;
            Ok(AcquiredPdf {
                input: PdfInput::Bytes(bytes),
                label: url.clone(),
            })
        }
        DocumentSource::LocalPath(path) => resolve_local(path),
    }
}

/// Read a file into memory as an upload.
///
/// The file name (without directories) becomes the document label.
pub async fn read_upload(path: &Path) -> Result<DocumentSource, AssistantError> {
    if path.is_dir() {
        return Err(AssistantError::InvalidInput {
            input: path.display().to_string(),
        });
    }
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => AssistantError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AssistantError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Read upload '{}' ({} bytes)", name, bytes.len());
    Ok(DocumentSource::Upload { name, bytes })
}

/// Validate that a local file exists and is readable.
fn resolve_local(path: &Path) -> Result<AcquiredPdf, AssistantError> {
    if !path.exists() {
        return Err(AssistantError::FileNotFound { path: path.to_path_buf() });
    }
    if path.is_dir() {
        return Err(AssistantError::InvalidInput {
            input: path.display().to_string(),
        });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AssistantError::PermissionDenied { path: path.to_path_buf() });
        }
        Err(_) => {
            return Err(AssistantError::FileNotFound { path: path.to_path_buf() });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(AcquiredPdf {
        input: PdfInput::Path(path.to_path_buf()),
        label: path.display().to_string(),
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, AssistantError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AssistantError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_err = |e: reqwest::Error| {
        if e.is_timeout() {
            AssistantError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AssistantError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_err)?;

    if !response.status().is_success() {
        return Err(AssistantError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(map_send_err)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn parse_classifies_sources() {
        assert_eq!(
            DocumentSource::parse(" https://a.org/x.pdf ").unwrap(),
            DocumentSource::Url("https://a.org/x.pdf".into())
        );
        assert_eq!(
            DocumentSource::parse("sample.pdf").unwrap(),
            DocumentSource::LocalPath(PathBuf::from("sample.pdf"))
        );
        assert!(DocumentSource::parse("ftp://a.org/x.pdf").is_err());
        assert!(DocumentSource::parse("   ").is_err());
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let config = AssistantConfig::default();
        let source = DocumentSource::LocalPath(PathBuf::from("/definitely/not/here.pdf"));
        let err = acquire(&source, &config).await.unwrap_err();
        assert!(matches!(err, AssistantError::FileNotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn existing_local_file_resolves_to_path() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 test").unwrap();
        let source = DocumentSource::LocalPath(tmp.path().to_path_buf());

        let acquired = acquire(&source, &AssistantConfig::default()).await.unwrap();
        assert_eq!(acquired.input, PdfInput::Path(tmp.path().to_path_buf()));
    }

    #[tokio::test]
    async fn upload_is_passed_through_unvalidated() {
        let source = DocumentSource::Upload {
            name: "notes.pdf".into(),
            bytes: b"not really a pdf".to_vec(),
        };
        let acquired = acquire(&source, &AssistantConfig::default()).await.unwrap();
        assert_eq!(acquired.input, PdfInput::Bytes(b"not really a pdf".to_vec()));
        assert_eq!(acquired.label, "notes.pdf");
    }

    #[tokio::test]
    async fn directory_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let source = DocumentSource::LocalPath(dir.path().to_path_buf());
        let err = acquire(&source, &AssistantConfig::default()).await.unwrap_err();
        assert!(matches!(err, AssistantError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn read_upload_uses_file_name_as_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7 body").unwrap();

        match read_upload(&path).await.unwrap() {
            DocumentSource::Upload { name, bytes } => {
                assert_eq!(name, "report.pdf");
                assert_eq!(bytes, b"%PDF-1.7 body".to_vec());
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_upload_missing_file() {
        let err = read_upload(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::FileNotFound { .. }));
    }
}

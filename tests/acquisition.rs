//! Source acquisition over real sockets and the local filesystem.
//!
//! URL tests run against a one-shot HTTP responder on 127.0.0.1, so no
//! outside network is needed.

mod common;

use common::{init_tracing, serve_once, FakeExtractor, MockBackends};
use edgequake_pdfqa::{
    acquire, read_upload, AssistantConfig, AssistantError, DocumentSource, ErrorKind, PdfInput,
    Session,
};
use std::time::Duration;

const PDF_BODY: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

#[tokio::test]
async fn url_body_is_kept_in_memory() {
    init_tracing();
    let url = serve_once(200, PDF_BODY, Duration::ZERO).await;
    let acquired = acquire(&DocumentSource::Url(url.clone()), &AssistantConfig::default())
        .await
        .unwrap();
    assert_eq!(acquired.input, PdfInput::Bytes(PDF_BODY.to_vec()));
    assert_eq!(acquired.label, url);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    init_tracing();
    for status in [404u16, 403, 500] {
        let url = serve_once(status, b"nope", Duration::ZERO).await;
        let err = acquire(&DocumentSource::Url(url), &AssistantConfig::default())
            .await
            .unwrap_err();
        match err {
            AssistantError::HttpStatus { status: got, .. } => assert_eq!(got, status),
            other => panic!("expected HttpStatus for {status}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn slow_server_times_out() {
    init_tracing();
    let url = serve_once(200, PDF_BODY, Duration::from_secs(5)).await;
    let config = AssistantConfig::builder()
        .download_timeout_secs(1)
        .build()
        .unwrap();

    let err = acquire(&DocumentSource::Url(url), &config).await.unwrap_err();
    match err {
        AssistantError::DownloadTimeout { secs, .. } => assert_eq!(secs, 1),
        other => panic!("expected DownloadTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_download_failure() {
    init_tracing();
    // Bind then drop to get a port with nothing listening on it.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let err = acquire(
        &DocumentSource::Url(format!("http://127.0.0.1:{port}/x.pdf")),
        &AssistantConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(
        matches!(err, AssistantError::DownloadFailed { .. }),
        "got {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Acquisition);
}

#[tokio::test]
async fn failed_download_leaves_session_empty() {
    init_tracing();
    let extractor = FakeExtractor::with_pages(&["never"]);
    let backends = MockBackends::new();
    let mut session = Session::new(
        AssistantConfig::default(),
        backends.assistant(),
        extractor.clone(),
    );

    let url = serve_once(404, b"missing", Duration::ZERO).await;
    let err = session.load(DocumentSource::Url(url)).await.unwrap_err();
    assert!(matches!(err, AssistantError::HttpStatus { status: 404, .. }));
    assert!(!session.is_loaded());
    assert_eq!(extractor.call_count(), 0);
}

#[tokio::test]
async fn downloaded_html_is_not_a_pdf() {
    init_tracing();
    let extractor = FakeExtractor::with_pages(&["never"]);
    let mut session = Session::new(
        AssistantConfig::default(),
        MockBackends::new().assistant(),
        extractor.clone(),
    );

    let url = serve_once(200, b"<html><body>login</body></html>", Duration::ZERO).await;
    let err = session.load(DocumentSource::Url(url)).await.unwrap_err();
    assert!(matches!(err, AssistantError::NotAPdf { .. }), "got {err:?}");
    assert_eq!(extractor.call_count(), 0);
}

#[tokio::test]
async fn downloaded_pdf_loads_into_session() {
    init_tracing();
    let extractor = FakeExtractor::with_pages(&["Remote ", "text"]);
    let mut session = Session::new(
        AssistantConfig::default(),
        MockBackends::new().assistant(),
        extractor.clone(),
    );

    let url = serve_once(200, PDF_BODY, Duration::ZERO).await;
    let doc = session.load(DocumentSource::Url(url.clone())).await.unwrap();
    assert_eq!(doc.text, "Remote text");
    assert_eq!(doc.source, url);
}

#[tokio::test]
async fn uploaded_file_loads_under_its_file_name() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quarterly report.pdf");
    std::fs::write(&path, PDF_BODY).unwrap();

    let mut session = Session::new(
        AssistantConfig::default(),
        MockBackends::new().assistant(),
        FakeExtractor::with_pages(&["Q3 revenue grew."]),
    );
    let source = read_upload(&path).await.unwrap();
    let doc = session.load(source).await.unwrap();
    assert_eq!(doc.source, "quarterly report.pdf");
    assert_eq!(doc.char_count(), "Q3 revenue grew.".len());
}

#[test]
fn user_strings_classify_as_url_or_path() {
    assert!(matches!(
        DocumentSource::parse("https://arxiv.org/pdf/1706.03762").unwrap(),
        DocumentSource::Url(_)
    ));
    assert!(matches!(
        DocumentSource::parse("./papers/attention.pdf").unwrap(),
        DocumentSource::LocalPath(_)
    ));
    assert!(matches!(
        DocumentSource::parse("file:///tmp/a.pdf"),
        Err(AssistantError::InvalidInput { .. })
    ));
}

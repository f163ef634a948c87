//! Shared fixtures for the integration tests: recording mock backends, a
//! canned-page extractor, and a one-shot HTTP responder.

#![allow(dead_code)]

use edgequake_pdfqa::{
    AssistantError, Assistant, ChatBackend, ChatReply, PdfInput, PdfTextExtractor,
    QuestionAnswerer, Summarizer, SummaryBounds,
};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Backends ─────────────────────────────────────────────────────────────

/// One mock standing in for all three backends. Every call is counted and
/// its input recorded.
#[derive(Default)]
pub struct MockBackends {
    pub summarize_calls: AtomicUsize,
    pub answer_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub summarize_inputs: Mutex<Vec<(String, SummaryBounds)>>,
    pub answer_inputs: Mutex<Vec<(String, String)>>,
    pub chat_prompts: Mutex<Vec<String>>,
    /// When set, every call fails with a clone of this error.
    pub fail_with: Mutex<Option<AssistantError>>,
}

impl MockBackends {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(err: AssistantError) -> Arc<Self> {
        let mock = Self::default();
        *mock.fail_with.lock().unwrap() = Some(err);
        Arc::new(mock)
    }

    pub fn assistant(self: &Arc<Self>) -> Assistant {
        Assistant::with_backends(self.clone(), self.clone(), self.clone())
    }

    pub fn total_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
            + self.answer_calls.load(Ordering::SeqCst)
            + self.chat_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), AssistantError> {
        match self.fail_with.lock().unwrap().as_ref() {
            Some(e) => Err(clone_error(e)),
            None => Ok(()),
        }
    }
}

fn clone_error(e: &AssistantError) -> AssistantError {
    match e {
        AssistantError::AuthError { backend, detail } => AssistantError::AuthError {
            backend: backend.clone(),
            detail: detail.clone(),
        },
        AssistantError::BackendUnavailable { backend, reason } => {
            AssistantError::BackendUnavailable {
                backend: backend.clone(),
                reason: reason.clone(),
            }
        }
        other => AssistantError::Internal(other.to_string()),
    }
}

impl Summarizer for MockBackends {
    fn name(&self) -> &str {
        "mock-summarizer"
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        bounds: SummaryBounds,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(async move {
            self.summarize_calls.fetch_add(1, Ordering::SeqCst);
            self.summarize_inputs
                .lock()
                .unwrap()
                .push((text.to_string(), bounds));
            self.check_failure()?;
            Ok::<_, AssistantError>(format!("summary #{}", self.summarize_calls.load(Ordering::SeqCst)))
        })
    }
}

impl QuestionAnswerer for MockBackends {
    fn name(&self) -> &str {
        "mock-qa"
    }

    fn answer<'a>(
        &'a self,
        question: &'a str,
        context: &'a str,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(async move {
            self.answer_calls.fetch_add(1, Ordering::SeqCst);
            self.answer_inputs
                .lock()
                .unwrap()
                .push((question.to_string(), context.to_string()));
            self.check_failure()?;
            Ok::<_, AssistantError>("an answer span".to_string())
        })
    }
}

impl ChatBackend for MockBackends {
    fn name(&self) -> &str {
        "mock-chat"
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<ChatReply, AssistantError>> {
        Box::pin(async move {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.chat_prompts.lock().unwrap().push(prompt.to_string());
            self.check_failure()?;
            Ok::<_, AssistantError>(ChatReply {
                content: "```markdown\n- point one\n- point two\n```".to_string(),
                prompt_tokens: 42,
                completion_tokens: 7,
            })
        })
    }
}

// ── Extractor ────────────────────────────────────────────────────────────

/// Returns canned pages, or an error, and counts calls.
pub struct FakeExtractor {
    pages: Mutex<Result<Vec<String>, String>>,
    pub calls: AtomicUsize,
    pub last_password: Mutex<Option<String>>,
}

impl FakeExtractor {
    pub fn with_pages(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(Ok(pages.iter().map(|p| p.to_string()).collect())),
            calls: AtomicUsize::new(0),
            last_password: Mutex::new(None),
        })
    }

    /// Switch the pages returned by subsequent calls.
    pub fn set_pages(&self, pages: &[&str]) {
        *self.pages.lock().unwrap() = Ok(pages.iter().map(|p| p.to_string()).collect());
    }

    /// Make subsequent calls fail as a corrupt document.
    pub fn set_corrupt(&self, detail: &str) {
        *self.pages.lock().unwrap() = Err(detail.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfTextExtractor for FakeExtractor {
    fn page_texts(
        &self,
        input: &PdfInput,
        password: Option<&str>,
    ) -> Result<Vec<String>, AssistantError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_password.lock().unwrap() = password.map(str::to_string);
        match &*self.pages.lock().unwrap() {
            Ok(pages) => Ok(pages.clone()),
            Err(detail) => Err(AssistantError::CorruptPdf {
                source_name: format!("{input:?}"),
                detail: detail.clone(),
            }),
        }
    }
}

// ── HTTP ─────────────────────────────────────────────────────────────────

/// Serve exactly one HTTP response on a random local port and return the
/// URL to fetch. `delay` is waited before anything is written.
pub async fn serve_once(status: u16, body: &'static [u8], delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        tokio::time::sleep(delay).await;

        let head = format!(
            "HTTP/1.1 {status} {}\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            reason(status),
            body.len()
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(body).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/document.pdf")
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

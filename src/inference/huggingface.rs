//! Hugging Face inference endpoint backends (summarisation and QA).
//!
//! Both talk to `{hf_endpoint}/{model_id}` with a JSON body shaped like the
//! `transformers` pipeline arguments. The endpoint can be the hosted router
//! or a self-hosted inference server exposing the same routes.
//!
//! No request timeout is set: a model that is still loading can take a
//! while, and the user is waiting on that answer anyway.

use super::{QuestionAnswerer, SummaryBounds, Summarizer};
use crate::config::AssistantConfig;
use crate::error::AssistantError;
use futures::future::BoxFuture;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// HTTP client shared by the Hugging Face backends.
pub fn build_client() -> Result<reqwest::Client, AssistantError> {
    reqwest::Client::builder()
        .user_agent(concat!("edgequake-pdfqa/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AssistantError::Internal(format!("HTTP client: {e}")))
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: SummarizationParameters,
}

#[derive(Debug, Serialize)]
struct SummarizationParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct QaAnswer {
    answer: String,
    #[serde(default)]
    score: f64,
}

// Some deployments wrap the single answer in an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaResponse {
    One(QaAnswer),
    Many(Vec<QaAnswer>),
}

// ── Backends ─────────────────────────────────────────────────────────────

/// Abstractive summarisation through a Hugging Face endpoint.
pub struct HuggingFaceSummarizer {
    client: reqwest::Client,
    url: String,
    model: String,
    token: Option<String>,
}

impl HuggingFaceSummarizer {
    pub fn new(client: reqwest::Client, config: &AssistantConfig) -> Self {
        Self {
            client,
            url: model_url(&config.hf_endpoint, &config.summarization_model),
            model: config.summarization_model.clone(),
            token: config.hf_token.clone(),
        }
    }
}

impl Summarizer for HuggingFaceSummarizer {
    fn name(&self) -> &str {
        &self.model
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        bounds: SummaryBounds,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(async move {
            let body = SummarizationRequest {
                inputs: text,
                parameters: SummarizationParameters {
                    max_length: bounds.max_length,
                    min_length: bounds.min_length,
                    do_sample: false,
                },
            };
            let raw = post_json(
                &self.client,
                &self.url,
                self.token.as_deref(),
                &body,
                &self.model,
            )
            .await?;
            parse_summary(&raw, &self.model)
        })
    }
}

/// Extractive question answering through a Hugging Face endpoint.
pub struct HuggingFaceQa {
    client: reqwest::Client,
    url: String,
    model: String,
    token: Option<String>,
}

impl HuggingFaceQa {
    pub fn new(client: reqwest::Client, config: &AssistantConfig) -> Self {
        Self {
            client,
            url: model_url(&config.hf_endpoint, &config.qa_model),
            model: config.qa_model.clone(),
            token: config.hf_token.clone(),
        }
    }
}

impl QuestionAnswerer for HuggingFaceQa {
    fn name(&self) -> &str {
        &self.model
    }

    fn answer<'a>(
        &'a self,
        question: &'a str,
        context: &'a str,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        Box::pin(async move {
            let body = QaRequest {
                inputs: QaInputs { question, context },
            };
            let raw = post_json(
                &self.client,
                &self.url,
                self.token.as_deref(),
                &body,
                &self.model,
            )
            .await?;
            parse_answer(&raw, &self.model)
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn model_url(endpoint: &str, model: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), model.trim_matches('/'))
}

/// POST a JSON body and return the raw response text on 2xx.
async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
    body: &T,
    backend: &str,
) -> Result<String, AssistantError> {
    let mut request = client.post(url).json(body);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AssistantError::BackendUnavailable {
            backend: backend.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let text = response
        .text()
        .await
        .map_err(|e| AssistantError::BackendUnavailable {
            backend: backend.to_string(),
            reason: e.to_string(),
        })?;

    debug!("{} answered HTTP {} ({} bytes)", backend, status, text.len());

    if !status.is_success() {
        return Err(status_error(backend, status.as_u16(), &text, retry_after));
    }
    Ok(text)
}

/// Map a non-success response to an error, keeping the endpoint's message.
fn status_error(backend: &str, status: u16, body: &str, retry_after: Option<u64>) -> AssistantError {
    let message = error_message(body);
    match status {
        401 | 403 => AssistantError::AuthError {
            backend: backend.to_string(),
            detail: message,
        },
        429 => AssistantError::RateLimitExceeded {
            backend: backend.to_string(),
            retry_after_secs: retry_after,
        },
        _ => AssistantError::BackendStatus {
            backend: backend.to_string(),
            status,
            message,
        },
    }
}

/// Pull `error` out of an error body: a string, or a list of strings.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| match &v["error"] {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        _ => None,
    });
    match from_json {
        Some(msg) if !msg.is_empty() => msg,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().chars().take(200).collect(),
    }
}

fn parse_summary(raw: &str, backend: &str) -> Result<String, AssistantError> {
    let items: Vec<SummaryItem> =
        serde_json::from_str(raw).map_err(|e| AssistantError::MalformedResponse {
            backend: backend.to_string(),
            detail: e.to_string(),
        })?;
    items
        .into_iter()
        .next()
        .map(|item| item.summary_text)
        .ok_or_else(|| AssistantError::MalformedResponse {
            backend: backend.to_string(),
            detail: "no summary in response".to_string(),
        })
}

fn parse_answer(raw: &str, backend: &str) -> Result<String, AssistantError> {
    let response: QaResponse =
        serde_json::from_str(raw).map_err(|e| AssistantError::MalformedResponse {
            backend: backend.to_string(),
            detail: e.to_string(),
        })?;
    let best = match response {
        QaResponse::One(answer) => Some(answer),
        QaResponse::Many(answers) => answers.into_iter().next(),
    }
    .ok_or_else(|| AssistantError::MalformedResponse {
        backend: backend.to_string(),
        detail: "no answer in response".to_string(),
    })?;

    debug!("QA answer score: {:.3}", best.score);
    Ok(best.answer)
}

//! Configuration types for the document assistant.
//!
//! Every knob lives in [`AssistantConfig`], built through
//! [`AssistantConfigBuilder`]. The config is constructed once at startup and
//! passed by reference to each backend; nothing reads credentials from
//! process-wide state after that point.
//!
//! Credentials are validated twice, at different strengths:
//!
//! * [`AssistantConfigBuilder::build`] rejects credentials that are present
//!   but obviously wrong (template placeholders, whitespace, wrong prefix).
//! * [`AssistantConfig::credential_report`] reports which credentials are
//!   missing. A missing key never blocks startup; the action that needs it
//!   fails when attempted.

use crate::error::AssistantError;
use crate::pipeline::input::{is_url, DocumentSource};
use edgequake_llm::LLMProvider;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Hugging Face inference endpoint. Model ids are appended as a path.
pub const DEFAULT_HF_ENDPOINT: &str = "https://router.huggingface.co/hf-inference/models";

/// Default abstractive summarisation model.
pub const DEFAULT_SUMMARIZATION_MODEL: &str = "sshleifer/distilbart-cnn-12-6";

/// Default extractive QA model.
pub const DEFAULT_QA_MODEL: &str = "distilbert-base-cased-distilled-squad";

/// Default chat provider and model for GPT analysis.
pub const DEFAULT_CHAT_PROVIDER: &str = "openai";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Configuration for the document assistant.
///
/// # Example
/// ```rust
/// use edgequake_pdfqa::AssistantConfig;
///
/// let config = AssistantConfig::builder()
///     .chat_model("gpt-4o-mini")
///     .download_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.summary_max_length, 150);
/// ```
#[derive(Clone)]
pub struct AssistantConfig {
    /// OpenAI API key. `None` disables GPT analysis until one is supplied.
    pub openai_api_key: Option<String>,

    /// Hugging Face access token. Optional: anonymous calls work with lower
    /// rate limits.
    pub hf_token: Option<String>,

    /// Chat provider name passed to `edgequake_llm::ProviderFactory`. Default: "openai".
    pub chat_provider: String,

    /// Chat model id. Default: "gpt-4o".
    pub chat_model: String,

    /// Pre-constructed chat provider. Takes precedence over `chat_provider`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for GPT analysis. `None` uses the provider default.
    pub chat_temperature: Option<f32>,

    /// Output token cap for GPT analysis. `None` uses the provider default.
    pub chat_max_tokens: Option<usize>,

    /// Base URL of the Hugging Face inference API (no trailing slash).
    pub hf_endpoint: String,

    /// Summarisation model id.
    pub summarization_model: String,

    /// Extractive QA model id.
    pub qa_model: String,

    /// Target summary length in tokens. Default: 150.
    pub summary_max_length: usize,

    /// Minimum summary length in tokens. Default: 30.
    pub summary_min_length: usize,

    /// Download timeout for URL sources in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Named documents offered by the `sample` command.
    pub samples: Vec<SampleDocument>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            hf_token: None,
            chat_provider: DEFAULT_CHAT_PROVIDER.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            provider: None,
            chat_temperature: None,
            chat_max_tokens: None,
            hf_endpoint: DEFAULT_HF_ENDPOINT.to_string(),
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            qa_model: DEFAULT_QA_MODEL.to_string(),
            summary_max_length: 150,
            summary_min_length: 30,
            download_timeout_secs: 30,
            password: None,
            samples: Vec::new(),
        }
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<redacted>"))
            .field("chat_provider", &self.chat_provider)
            .field("chat_model", &self.chat_model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("chat_temperature", &self.chat_temperature)
            .field("chat_max_tokens", &self.chat_max_tokens)
            .field("hf_endpoint", &self.hf_endpoint)
            .field("summarization_model", &self.summarization_model)
            .field("qa_model", &self.qa_model)
            .field("summary_max_length", &self.summary_max_length)
            .field("summary_min_length", &self.summary_min_length)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("samples", &self.samples)
            .finish()
    }
}

impl AssistantConfig {
    /// Create a new builder for `AssistantConfig`.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder {
            config: Self::default(),
        }
    }

    /// Report which credentials are configured, missing, or malformed.
    ///
    /// The OpenAI key is only checked when `chat_provider` is "openai";
    /// other providers read their own keys and report it as `NotUsed`.
    pub fn credential_report(&self) -> CredentialReport {
        let openai = if self.chat_provider.trim().eq_ignore_ascii_case("openai") {
            check_credential(self.openai_api_key.as_deref(), &RE_OPENAI_KEY, "sk-")
        } else {
            CredentialStatus::NotUsed
        };
        CredentialReport {
            chat_provider: self.chat_provider.clone(),
            openai,
            huggingface: check_credential(self.hf_token.as_deref(), &RE_HF_TOKEN, "hf_"),
        }
    }

    /// Look up a sample document by name (case-insensitive).
    pub fn sample(&self, name: &str) -> Option<&SampleDocument> {
        self.samples
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Builder for [`AssistantConfig`].
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl fmt::Debug for AssistantConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AssistantConfigBuilder {
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.openai_api_key = non_empty(key.into());
        self
    }

    pub fn hf_token(mut self, token: impl Into<String>) -> Self {
        self.config.hf_token = non_empty(token.into());
        self
    }

    pub fn chat_provider(mut self, name: impl Into<String>) -> Self {
        self.config.chat_provider = name.into();
        self
    }

    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn chat_temperature(mut self, t: f32) -> Self {
        self.config.chat_temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn chat_max_tokens(mut self, n: usize) -> Self {
        self.config.chat_max_tokens = Some(n.max(1));
        self
    }

    pub fn hf_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.hf_endpoint = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn summarization_model(mut self, model: impl Into<String>) -> Self {
        self.config.summarization_model = model.into();
        self
    }

    pub fn qa_model(mut self, model: impl Into<String>) -> Self {
        self.config.qa_model = model.into();
        self
    }

    pub fn summary_lengths(mut self, min_length: usize, max_length: usize) -> Self {
        self.config.summary_min_length = min_length;
        self.config.summary_max_length = max_length;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn sample(mut self, sample: SampleDocument) -> Self {
        self.config.samples.push(sample);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AssistantConfig, AssistantError> {
        let c = &self.config;
        if c.summary_min_length > c.summary_max_length {
            return Err(AssistantError::InvalidConfig(format!(
                "summary min length ({}) exceeds max length ({})",
                c.summary_min_length, c.summary_max_length
            )));
        }
        if !is_url(&c.hf_endpoint) {
            return Err(AssistantError::InvalidConfig(format!(
                "Hugging Face endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.hf_endpoint
            )));
        }
        if c.chat_model.trim().is_empty() {
            return Err(AssistantError::InvalidConfig("chat model is empty".into()));
        }

        let report = c.credential_report();
        if let CredentialStatus::Malformed(reason) = &report.openai {
            return Err(AssistantError::InvalidConfig(format!(
                "OpenAI API key: {reason}"
            )));
        }
        if let CredentialStatus::Malformed(reason) = &report.huggingface {
            return Err(AssistantError::InvalidConfig(format!(
                "Hugging Face token: {reason}"
            )));
        }
        Ok(self.config)
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ── Credentials ──────────────────────────────────────────────────────────

static RE_OPENAI_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sk-[A-Za-z0-9_\-]{16,}$").unwrap());

static RE_HF_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^hf_[A-Za-z0-9]{16,}$").unwrap());

// Matches the copy-paste placeholders people leave in config files,
// e.g. "Enter your OpenAI API key here" or "your-openai-api-key-here".
static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^enter\s+your\b|^your[-_ ].*here$|^<.*>$|^x{4,}$)").unwrap());

/// State of one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CredentialStatus {
    Configured,
    Missing,
    Malformed(String),
    /// Not read by the configured backend.
    NotUsed,
}

impl CredentialStatus {
    pub fn is_configured(&self) -> bool {
        matches!(self, CredentialStatus::Configured)
    }
}

/// Result of [`AssistantConfig::credential_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialReport {
    pub chat_provider: String,
    pub openai: CredentialStatus,
    pub huggingface: CredentialStatus,
}

fn check_credential(value: Option<&str>, format: &Regex, prefix: &str) -> CredentialStatus {
    let Some(v) = value else {
        return CredentialStatus::Missing;
    };
    if RE_PLACEHOLDER.is_match(v) {
        return CredentialStatus::Malformed("looks like a template placeholder".into());
    }
    if v.chars().any(char::is_whitespace) {
        return CredentialStatus::Malformed("contains whitespace".into());
    }
    if !format.is_match(v) {
        return CredentialStatus::Malformed(format!(
            "expected a token starting with '{prefix}'"
        ));
    }
    CredentialStatus::Configured
}

// ── Sample documents ─────────────────────────────────────────────────────

/// A named PDF location offered to the user as a ready-made choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleDocument {
    pub name: String,
    /// HTTP/HTTPS URL or local path.
    pub location: String,
}

impl SampleDocument {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Parse a `NAME=LOCATION` pair.
    pub fn parse(s: &str) -> Result<Self, AssistantError> {
        let (name, location) = s.split_once('=').ok_or_else(|| {
            AssistantError::InvalidConfig(format!("sample '{s}' must be NAME=LOCATION"))
        })?;
        let (name, location) = (name.trim(), location.trim());
        if name.is_empty() || location.is_empty() {
            return Err(AssistantError::InvalidConfig(format!(
                "sample '{s}' must be NAME=LOCATION"
            )));
        }
        Ok(Self::new(name, location))
    }

    /// The source this sample resolves to.
    pub fn source(&self) -> DocumentSource {
        if is_url(&self.location) {
            DocumentSource::Url(self.location.clone())
        } else {
            DocumentSource::LocalPath(PathBuf::from(&self.location))
        }
    }
}

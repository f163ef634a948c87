//! GPT analysis through an `edgequake_llm` chat provider.
//!
//! ## Provider resolution
//!
//! The provider is resolved on every call, not at startup:
//!
//! 1. **Pre-built provider** (`config.provider`): used as-is. Tests and
//!    library callers with custom middleware go through here.
//! 2. **OpenAI with a configured key** (`config.openai_api_key`): an
//!    [`OpenAIProvider`] is built from that key and `config.chat_model`. The
//!    process environment is not consulted.
//! 3. **Named provider + model** (`config.chat_provider`, `config.chat_model`):
//!    [`ProviderFactory::create_llm_provider`] reads the provider's API key
//!    from the environment (`OPENAI_API_KEY` for "openai").
//!
//! Resolving late means a missing key only fails the GPT action itself.
//! Summarisation and QA keep working without it.

use super::{ChatBackend, ChatReply};
use crate::config::AssistantConfig;
use crate::error::AssistantError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const OPENAI_KEY_HINT: &str = "Set OPENAI_API_KEY or pass --openai-api-key.\n\
Create a key at https://platform.openai.com/api-keys";

/// [`ChatBackend`] backed by an `edgequake_llm` provider.
pub struct LlmChatBackend {
    provider_name: String,
    model: String,
    preset: Option<Arc<dyn LLMProvider>>,
    openai_api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl LlmChatBackend {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            provider_name: config.chat_provider.clone(),
            model: config.chat_model.clone(),
            preset: config.provider.clone(),
            openai_api_key: config.openai_api_key.clone(),
            temperature: config.chat_temperature,
            max_tokens: config.chat_max_tokens,
        }
    }

    fn resolve_provider(&self) -> Result<Arc<dyn LLMProvider>, AssistantError> {
        if let Some(ref provider) = self.preset {
            return Ok(Arc::clone(provider));
        }
        if self.is_openai() {
            if let Some(ref key) = self.openai_api_key {
                debug!("Using OpenAI key from config for {}", self.model);
                return Ok(Arc::new(OpenAIProvider::new(key.as_str()).with_model(&self.model)));
            }
        }

        ProviderFactory::create_llm_provider(&self.provider_name, &self.model).map_err(|e| {
            let hint = if self.is_openai() {
                format!("{OPENAI_KEY_HINT}\nError: {e}")
            } else {
                format!("Check the API key for provider '{}'.\nError: {e}", self.provider_name)
            };
            AssistantError::ProviderNotConfigured {
                provider: self.provider_name.clone(),
                hint,
            }
        })
    }

    fn is_openai(&self) -> bool {
        self.provider_name.trim().eq_ignore_ascii_case("openai")
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }
}

impl ChatBackend for LlmChatBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<ChatReply, AssistantError>> {
        Box::pin(async move {
            let provider = self.resolve_provider()?;
            let messages = vec![ChatMessage::user(prompt)];
            let options = self.options();

            let start = Instant::now();
            let response = provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| {
                    let message = format!("{}", e);
                    warn!("Chat completion failed: {}", message);
                    classify_llm_error(&self.provider_name, message)
                })?;

            debug!(
                "{}: {} input tokens, {} output tokens, {:?}",
                self.model,
                response.prompt_tokens,
                response.completion_tokens,
                start.elapsed()
            );

            Ok::<_, AssistantError>(ChatReply {
                content: response.content,
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
            })
        })
    }
}

/// Map a provider error message onto the inference error taxonomy.
///
/// The provider only hands back a message, so this goes by its text.
fn classify_llm_error(backend: &str, message: String) -> AssistantError {
    let lower = message.to_lowercase();
    if lower.contains("401")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
        || lower.contains("incorrect api key")
        || lower.contains("authentication")
    {
        AssistantError::AuthError {
            backend: backend.to_string(),
            detail: message,
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        AssistantError::RateLimitExceeded {
            backend: backend.to_string(),
            retry_after_secs: None,
        }
    } else {
        AssistantError::LlmApiError { message }
    }
}

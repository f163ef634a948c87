//! Prompt templates for GPT analysis.
//!
//! Every template lives here so the exact wording sent to the chat provider
//! can be inspected and tested without a provider. The document excerpt is
//! appended verbatim after the template; it is already cut to
//! [`crate::inference::GPT_DOCUMENT_CHARS`] characters by the caller.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Prefix for [`AnalysisKind::Summarize`].
pub const SUMMARIZE_PROMPT: &str = "Summarize this document concisely:\n\n";

/// Prefix for [`AnalysisKind::KeyPoints`].
pub const KEY_POINTS_PROMPT: &str = "List the key points from this document:\n\n";

/// Separator placed between a custom prompt and the document excerpt.
pub const CUSTOM_DOCUMENT_SEPARATOR: &str = "\n\nDocument:\n";

/// The analysis the user picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "prompt", rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Concise summary.
    Summarize,
    /// Bullet list of key points.
    KeyPoints,
    /// Free-text instruction written by the user.
    Custom(String),
}

impl AnalysisKind {
    /// Build the full prompt from the (already truncated) document excerpt.
    pub fn build_prompt(&self, excerpt: &str) -> String {
        match self {
            AnalysisKind::Summarize => format!("{SUMMARIZE_PROMPT}{excerpt}"),
            AnalysisKind::KeyPoints => format!("{KEY_POINTS_PROMPT}{excerpt}"),
            AnalysisKind::Custom(prompt) => {
                format!("{prompt}{CUSTOM_DOCUMENT_SEPARATOR}{excerpt}")
            }
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Summarize => f.write_str("Summarize"),
            AnalysisKind::KeyPoints => f.write_str("Key Points"),
            AnalysisKind::Custom(_) => f.write_str("Custom Prompt"),
        }
    }
}

/// Parses `summary`/`summarize` and `key-points`/`keypoints`.
/// Custom prompts carry text, so they are built with [`AnalysisKind::Custom`].
impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "summary" | "summarize" | "summarise" => Ok(AnalysisKind::Summarize),
            "key-points" | "keypoints" | "points" => Ok(AnalysisKind::KeyPoints),
            other => Err(format!(
                "unknown analysis '{other}' (expected summary, key-points, or custom <prompt>)"
            )),
        }
    }
}

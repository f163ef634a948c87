//! Parser for the interactive prompt.
//!
//! One line of input maps to one [`Command`]. The first word selects the
//! command (case-insensitive); the rest of the line is its argument, kept
//! verbatim apart from surrounding whitespace.

use crate::prompts::AnalysisKind;
use std::path::PathBuf;
use thiserror::Error;

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `load <path|url>`
    Load(String),
    /// `upload <path>`: read the file into memory and load the bytes.
    Upload(PathBuf),
    /// `sample` lists samples, `sample <name>` loads one.
    Sample(Option<String>),
    /// `text`: print the extracted text.
    Text,
    Summarize,
    /// `ask <question>`
    Ask(String),
    /// `analyze [summary|key-points|custom <prompt>]`; defaults to summary.
    Analyze(AnalysisKind),
    Status,
    Help,
    Quit,
    /// Blank line.
    Empty,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type `help` for the list of commands.")]
    Unknown(String),

    #[error("`{command}` needs an argument: {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    #[error("{0}")]
    InvalidAnalysis(String),
}

impl Command {
    /// Parse one line of user input.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Empty);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "load" | "open" => {
                required(rest, "load", "load <path|url>").map(|s| Command::Load(s.to_string()))
            }
            "upload" => required(rest, "upload", "upload <path>")
                .map(|s| Command::Upload(PathBuf::from(s))),
            "sample" | "samples" => Ok(Command::Sample(
                Some(rest).filter(|s| !s.is_empty()).map(str::to_string),
            )),
            "text" | "show" => Ok(Command::Text),
            "summarize" | "summarise" | "summary" => Ok(Command::Summarize),
            "ask" | "qa" => {
                required(rest, "ask", "ask <question>").map(|s| Command::Ask(s.to_string()))
            }
            "analyze" | "analyse" | "gpt" => parse_analysis(rest).map(Command::Analyze),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    usage: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, usage })
    } else {
        Ok(rest)
    }
}

fn parse_analysis(rest: &str) -> Result<AnalysisKind, CommandError> {
    if rest.is_empty() {
        return Ok(AnalysisKind::Summarize);
    }
    let (word, prompt) = match rest.split_once(char::is_whitespace) {
        Some((w, p)) => (w, p.trim()),
        None => (rest, ""),
    };
    if word.eq_ignore_ascii_case("custom") {
        return required(prompt, "analyze custom", "analyze custom <prompt>")
            .map(|p| AnalysisKind::Custom(p.to_string()));
    }
    rest.parse::<AnalysisKind>()
        .map_err(CommandError::InvalidAnalysis)
}

/// Text printed by `help`.
pub const HELP: &str = "\
Commands:
  load <path|url>          Load a PDF from a local path or an HTTP(S) URL
  upload <path>            Read a file into memory and load it as an upload
  sample [name]            List sample documents, or load one by name
  text                     Show the extracted text
  summarize                Summarise the document (Hugging Face)
  ask <question>           Answer a question from the document (Hugging Face)
  analyze [summary|key-points|custom <prompt>]
                           Analyse the document with the chat model
  status                   Show the loaded document and credential status
  help                     Show this help
  quit                     Leave";

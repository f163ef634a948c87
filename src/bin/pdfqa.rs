//! CLI binary for edgequake-pdfqa.
//!
//! A thin shim over the library crate: maps CLI flags to `AssistantConfig`,
//! then either runs the requested actions once and exits, or drops into an
//! interactive prompt that holds one document at a time.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfqa::{
    clean_response, read_upload, AnalysisKind, AssistantConfig, AssistantError, Command,
    CredentialReport, CredentialStatus, Document, DocumentSource, ErrorKind, SampleDocument,
    Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive session
  pdfqa

  # Load a document, then keep the prompt open
  pdfqa paper.pdf

  # One-shot actions
  pdfqa paper.pdf --summarize
  pdfqa https://arxiv.org/pdf/1706.03762 --ask "What architecture is proposed?"
  pdfqa paper.pdf --analyze key-points
  pdfqa paper.pdf --analyze custom --prompt "Explain the methodology"

  # Upload from stdin, JSON output
  cat report.pdf | pdfqa - --summarize --json

  # Named sample documents
  pdfqa --sample attention=https://arxiv.org/pdf/1706.03762

INTERACTIVE COMMANDS:
  load <path|url>, upload <path>, sample [name], text, summarize,
  ask <question>, analyze [summary|key-points|custom <prompt>],
  status, help, quit

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (GPT analysis)
                          https://platform.openai.com/api-keys
  HF_TOKEN                Hugging Face access token (summaries and answers)
                          https://huggingface.co/settings/tokens
  PDFQA_PROVIDER          Chat provider (openai, anthropic, gemini, ollama, ...)
  PDFQA_MODEL             Chat model ID
  PDFIUM_LIB_PATH         Path to libpdfium

SETUP:
  1. Set keys:   export OPENAI_API_KEY=sk-...  HF_TOKEN=hf_...
  2. Run:        pdfqa paper.pdf --summarize

  Summaries and answers only use the beginning of the document
  (1024 and 512 characters); GPT analysis uses the first 2000.
"#;

/// Summarise, question and analyse PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdfqa",
    version,
    about = "Summarise, question and analyse PDF documents",
    long_about = "Extract the text of a PDF (local file, URL, or stdin) and summarise it, \
answer questions about it with an extractive QA model, or analyse it with a chat model. \
Without an action flag an interactive prompt is started.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF path, HTTP/HTTPS URL, or `-` to read the PDF from stdin.
    input: Option<String>,

    /// OpenAI API key for GPT analysis.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Hugging Face access token for summarisation and QA.
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Chat provider for GPT analysis.
    #[arg(long, env = "PDFQA_PROVIDER", default_value = "openai")]
    provider: String,

    /// Chat model for GPT analysis.
    #[arg(long, env = "PDFQA_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Hugging Face inference endpoint; model ids are appended as a path.
    #[arg(long, env = "PDFQA_HF_ENDPOINT")]
    hf_endpoint: Option<String>,

    /// Summarisation model id.
    #[arg(long, env = "PDFQA_SUMMARIZATION_MODEL")]
    summarization_model: Option<String>,

    /// Extractive QA model id.
    #[arg(long, env = "PDFQA_QA_MODEL")]
    qa_model: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFQA_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFQA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Named sample document, NAME=LOCATION (repeatable).
    #[arg(long = "sample", value_name = "NAME=LOCATION")]
    samples: Vec<String>,

    /// Summarise the document and exit.
    #[arg(long)]
    summarize: bool,

    /// Answer a question about the document and exit.
    #[arg(long, value_name = "QUESTION")]
    ask: Option<String>,

    /// Run a GPT analysis and exit.
    #[arg(long, value_enum, value_name = "KIND")]
    analyze: Option<AnalyzeArg>,

    /// Instruction for `--analyze custom`.
    #[arg(long, requires = "analyze")]
    prompt: Option<String>,

    /// Print the extracted text and exit.
    #[arg(long)]
    show_text: bool,

    /// Output one JSON object instead of text (one-shot mode).
    #[arg(long)]
    json: bool,

    /// Disable spinners.
    #[arg(long, env = "PDFQA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFQA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "PDFQA_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum AnalyzeArg {
    Summary,
    KeyPoints,
    Custom,
}

impl Cli {
    fn one_shot(&self) -> bool {
        self.summarize || self.ask.is_some() || self.analyze.is_some() || self.show_text || self.json
    }

    fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress && !self.json
    }

    fn analysis_kind(&self) -> Result<Option<AnalysisKind>> {
        Ok(match self.analyze {
            None => None,
            Some(AnalyzeArg::Summary) => Some(AnalysisKind::Summarize),
            Some(AnalyzeArg::KeyPoints) => Some(AnalysisKind::KeyPoints),
            Some(AnalyzeArg::Custom) => {
                let prompt = self
                    .prompt
                    .clone()
                    .filter(|p| !p.trim().is_empty())
                    .context("`--analyze custom` needs --prompt \"...\"")?;
                Some(AnalysisKind::Custom(prompt))
            }
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would fight the spinner for the terminal, so the
    // default drops to WARN while spinners are on.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if cli.show_progress() {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    let report = config.credential_report();
    let mut session = Session::from_config(config).context("Failed to initialise backends")?;

    if cli.one_shot() {
        let input = cli
            .input
            .clone()
            .context("An input PDF (path, URL, or `-`) is required with action flags")?;
        return one_shot(&cli, &mut session, &input).await;
    }

    if !cli.quiet {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("pdfqa {}", env!("CARGO_PKG_VERSION")))
        );
        print_credentials(&report);
        eprintln!("{}", dim("Type `help` for commands, `quit` to leave."));
    }

    if let Some(ref input) = cli.input {
        match DocumentSource::parse(input) {
            Ok(source) => load_and_report(&mut session, source, &cli).await,
            Err(e) => render_error(&e),
        }
    }

    repl(&cli, &mut session).await
}

/// Map CLI args to `AssistantConfig`.
fn build_config(cli: &Cli) -> Result<AssistantConfig> {
    let mut builder = AssistantConfig::builder()
        .chat_provider(&cli.provider)
        .chat_model(&cli.model)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.openai_api_key {
        builder = builder.openai_api_key(key);
    }
    if let Some(ref token) = cli.hf_token {
        builder = builder.hf_token(token);
    }
    if let Some(ref endpoint) = cli.hf_endpoint {
        builder = builder.hf_endpoint(endpoint);
    }
    if let Some(ref model) = cli.summarization_model {
        builder = builder.summarization_model(model);
    }
    if let Some(ref model) = cli.qa_model {
        builder = builder.qa_model(model);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    for pair in &cli.samples {
        builder = builder.sample(SampleDocument::parse(pair).context("Invalid --sample")?);
    }

    builder.build().context("Invalid configuration")
}

// ── One-shot mode ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OneShotOutput<'a> {
    source: &'a str,
    page_count: usize,
    characters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<edgequake_pdfqa::Analysis>,
}

async fn one_shot(cli: &Cli, session: &mut Session, input: &str) -> Result<()> {
    let kind = cli.analysis_kind()?;

    let source = if input == "-" {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("Failed to read PDF from stdin")?;
        DocumentSource::Upload {
            name: "stdin".to_string(),
            bytes,
        }
    } else {
        DocumentSource::parse(input)?
    };

    let label = source.label();
    with_spinner(cli, &format!("Loading {label}"), session.load(source))
        .await
        .with_context(|| format!("Failed to load {label}"))?;
    let doc = session
        .document()
        .context("No document after a successful load")?;
    if !cli.quiet && !cli.json {
        print_extracted(doc);
    }

    let summary = if cli.summarize {
        Some(
            with_spinner(cli, "Summarizing", session.summarize())
                .await
                .context("Summarization failed")?,
        )
    } else {
        None
    };
    let answer = match cli.ask {
        Some(ref q) => Some(
            with_spinner(cli, "Answering", session.ask(q))
                .await
                .context("Question answering failed")?,
        ),
        None => None,
    };
    let analysis = match kind {
        Some(ref k) => Some(
            with_spinner(cli, &format!("Running {k} analysis"), session.analyze(k))
                .await
                .context("GPT analysis failed")?,
        ),
        None => None,
    };

    if cli.json {
        let output = OneShotOutput {
            source: &doc.source,
            page_count: doc.page_count,
            characters: doc.char_count(),
            text: cli.show_text.then_some(doc.text.as_str()),
            summary,
            question: cli.ask.as_deref(),
            answer,
            analysis,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.show_text {
        writeln!(out, "{}", doc.text).context("Failed to write to stdout")?;
    }
    if let Some(summary) = summary {
        section(&mut out, "Summary", &summary)?;
    }
    if let Some(answer) = answer {
        section(&mut out, "Answer", &answer)?;
    }
    if let Some(analysis) = analysis {
        section(
            &mut out,
            &format!("Analysis ({})", analysis.kind),
            &clean_response(&analysis.text),
        )?;
        if !cli.quiet {
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&analysis.prompt_tokens.to_string()),
                dim(&analysis.completion_tokens.to_string()),
            );
        }
    }
    Ok(())
}

fn section(out: &mut impl Write, title: &str, body: &str) -> Result<()> {
    writeln!(out, "{}", bold(title)).context("Failed to write to stdout")?;
    writeln!(out, "{}", body.trim_end()).context("Failed to write to stdout")?;
    Ok(())
}

// ── Interactive mode ─────────────────────────────────────────────────────

async fn repl(cli: &Cli, session: &mut Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", cyan("pdfqa>"));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            eprintln!();
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{} {}", red("✗"), e);
                continue;
            }
        };

        match command {
            Command::Empty => {}
            Command::Quit => return Ok(()),
            Command::Help => eprintln!("{}", edgequake_pdfqa::command::HELP),
            Command::Status => print_status(session),
            Command::Load(input) => match DocumentSource::parse(&input) {
                Ok(source) => load_and_report(session, source, cli).await,
                Err(e) => render_error(&e),
            },
            Command::Upload(path) => match read_upload(&path).await {
                Ok(source) => load_and_report(session, source, cli).await,
                Err(e) => render_error(&e),
            },
            Command::Sample(None) => print_samples(session.config()),
            Command::Sample(Some(name)) => {
                let msg = format!("Loading sample {name}");
                let result = with_spinner(cli, &msg, session.load_sample(&name))
                    .await
                    .map(|doc| doc.clone());
                match result {
                    Ok(doc) => print_extracted(&doc),
                    Err(e) => render_error(&e),
                }
            }
            Command::Text => match session.document() {
                Some(doc) => println!("{}", doc.text),
                None => render_error(&AssistantError::NoDocumentLoaded),
            },
            Command::Summarize => {
                match with_spinner(cli, "Summarizing", session.summarize()).await {
                    Ok(summary) => println!("{}\n{}", bold("Summary"), summary.trim_end()),
                    Err(e) => render_error(&e),
                }
            }
            Command::Ask(question) => {
                match with_spinner(cli, "Answering", session.ask(&question)).await {
                    Ok(answer) => println!("{}\n{}", bold("Answer"), answer.trim_end()),
                    Err(e) => render_error(&e),
                }
            }
            Command::Analyze(kind) => {
                let msg = format!("Running {kind} analysis");
                match with_spinner(cli, &msg, session.analyze(&kind)).await {
                    Ok(analysis) => println!(
                        "{}\n{}",
                        bold(&format!("Analysis ({})", analysis.kind)),
                        clean_response(&analysis.text).trim_end()
                    ),
                    Err(e) => render_error(&e),
                }
            }
        }
    }
}

async fn load_and_report(session: &mut Session, source: DocumentSource, cli: &Cli) {
    let msg = format!("Loading {}", source.label());
    let result = with_spinner(cli, &msg, session.load(source))
        .await
        .map(|doc| doc.clone());
    match result {
        Ok(doc) => print_extracted(&doc),
        Err(e) => render_error(&e),
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Run `fut` under a spinner when progress output is enabled.
async fn with_spinner<T>(cli: &Cli, msg: &str, fut: impl Future<Output = T>) -> T {
    if !cli.show_progress() {
        return fut.await;
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(format!("{msg}…"));
    bar.enable_steady_tick(Duration::from_millis(80));

    let out = fut.await;
    bar.finish_and_clear();
    out
}

fn print_extracted(doc: &Document) {
    eprintln!(
        "{} Extracted {} characters from {} ({} pages)",
        green("✔"),
        bold(&doc.char_count().to_string()),
        doc.source,
        doc.page_count
    );
}

fn render_error(e: &AssistantError) {
    let prefix = match e.kind() {
        ErrorKind::Acquisition => "Could not load document",
        ErrorKind::Extraction => "Could not extract text",
        ErrorKind::Inference => "Model request failed",
        ErrorKind::Session => "Not ready",
        ErrorKind::Config => "Configuration error",
        ErrorKind::Internal => "Internal error",
    };
    eprintln!("{} {}: {}", red("✗"), bold(prefix), e.to_string().trim_end());
}

fn print_status(session: &Session) {
    match session.document() {
        Some(doc) => eprintln!(
            "{} {}  {} pages  {} characters",
            green("●"),
            bold(&doc.source),
            doc.page_count,
            doc.char_count()
        ),
        None => eprintln!("{} No document loaded", dim("○")),
    }
    print_credentials(&session.config().credential_report());
}

fn print_credentials(report: &CredentialReport) {
    if report.openai == CredentialStatus::NotUsed {
        eprintln!(
            "  {} {:<20} {}",
            dim("·"),
            "Chat provider",
            dim(&format!(
                "GPT analysis via '{}' (reads its own API key)",
                report.chat_provider
            ))
        );
    } else {
        credential_line(
            "OpenAI API key",
            &report.openai,
            "GPT analysis",
            "https://platform.openai.com/api-keys",
        );
    }
    credential_line(
        "Hugging Face token",
        &report.huggingface,
        "summaries and answers (anonymous calls are rate-limited)",
        "https://huggingface.co/settings/tokens",
    );
}

fn credential_line(name: &str, status: &CredentialStatus, used_for: &str, link: &str) {
    match status {
        CredentialStatus::Configured => {
            eprintln!("  {} {:<20} {}", green("✓"), name, dim(used_for))
        }
        CredentialStatus::Missing => eprintln!(
            "  {} {:<20} {}  {}",
            yellow("!"),
            name,
            yellow("not set"),
            dim(&format!("get one at {link}"))
        ),
        CredentialStatus::Malformed(reason) => eprintln!(
            "  {} {:<20} {}",
            red("✗"),
            name,
            red(reason)
        ),
        CredentialStatus::NotUsed => {}
    }
}

fn print_samples(config: &AssistantConfig) {
    if config.samples.is_empty() {
        eprintln!(
            "{}",
            dim("No sample documents configured. Add some with --sample NAME=LOCATION.")
        );
        return;
    }
    eprintln!("{}", bold("Sample documents:"));
    for sample in &config.samples {
        eprintln!("  {:<16} {}", cyan(&sample.name), dim(&sample.location));
    }
}

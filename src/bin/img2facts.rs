//! CLI binary for img2facts.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use img2facts::{extract, extract_text, ExtractionConfig, ExtractionOutput};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract facts from a document image (provider auto-detected)
  img2facts invoice.png

  # Use a specific provider and model
  img2facts --provider openai --model gpt-4o-mini receipt.jpg

  # JSON output for scripting
  img2facts --json scan.tiff > facts.json

  # Offline pattern extraction over OCR text (no API key needed)
  img2facts --text "Invoice #: INV-42
Total: $1,650.00"

  # Pattern extraction over a text file
  img2facts --text-file ocr_output.txt

SUPPORTED PROVIDERS:
  Key          Default model                 Credential
  ──────────   ───────────────────────────   ───────────────────
  openrouter   qwen/qwen2.5-vl-72b-instruct  OPENROUTER_API_KEY
  openai       gpt-4o-mini                   OPENAI_API_KEY
  gemini       gemini-2.0-flash              GEMINI_API_KEY

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY   OpenRouter API key
  OPENAI_API_KEY       OpenAI API key
  GEMINI_API_KEY       Google Gemini API key
  IMG2FACTS_PROVIDER   Override provider auto-detection

IMAGE CONSTRAINTS:
  Formats: PNG, JPEG, GIF, TIFF, BMP
  Max file size: 15 MB; larger dimensions are downscaled to 2048 px

SETUP:
  1. Set an API key:  export OPENROUTER_API_KEY=sk-or-...
  2. Extract:         img2facts document.png
"#;

/// Extract labeled facts from document images using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "img2facts",
    version,
    about = "Extract labeled facts from document images using Vision LLMs",
    long_about = "Extract structured {label, value, remarks} facts from document images \
(invoices, receipts, forms) using Vision Language Models — or, offline, from OCR text \
using the built-in pattern pipeline.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a document image (PNG, JPEG, GIF, TIFF, BMP).
    #[arg(required_unless_present_any = ["text", "text_file"], conflicts_with_all = ["text", "text_file"])]
    image: Option<PathBuf>,

    /// Run the offline pattern pipeline over this OCR text instead.
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Run the offline pattern pipeline over the contents of this file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Provider key: openrouter, openai, gemini.
    #[arg(long, env = "IMG2FACTS_PROVIDER")]
    provider: Option<String>,

    /// Model ID override (e.g. gpt-4o-mini, gemini-2.0-flash).
    #[arg(long, env = "IMG2FACTS_MODEL")]
    model: Option<String>,

    /// Path to a text file containing a custom extraction prompt.
    #[arg(long, env = "IMG2FACTS_PROMPT")]
    prompt: Option<PathBuf>,

    /// Provider call timeout in seconds.
    #[arg(long, env = "IMG2FACTS_API_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Output structured JSON (ExtractionOutput) instead of a table.
    #[arg(long, env = "IMG2FACTS_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2FACTS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "IMG2FACTS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Pattern path (offline) ───────────────────────────────────────────
    if let Some(text) = resolve_text_input(&cli).await? {
        let output = extract_text(&text);
        print_output(&cli, &output)?;
        return Ok(());
    }

    // ── AI path ──────────────────────────────────────────────────────────
    let config = build_config(&cli).await?;
    let image = cli.image.as_ref().context("an image path is required")?;

    let output = extract(image, &config).await.context("Extraction failed")?;
    print_output(&cli, &output)?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}",
            dim(&format!(
                "{} records  —  {} / {}  —  {}ms total ({}ms in provider call)",
                output.stats.record_count,
                output.stats.provider,
                output.stats.model,
                output.stats.total_duration_ms,
                output.stats.dispatch_duration_ms,
            ))
        );
    }

    Ok(())
}

/// Resolve `--text` / `--text-file` into the pattern-path input, if given.
async fn resolve_text_input(cli: &Cli) -> Result<Option<String>> {
    if let Some(ref text) = cli.text {
        return Ok(Some(text.clone()));
    }
    if let Some(ref path) = cli.text_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read text from {path:?}"))?;
        return Ok(Some(text));
    }
    Ok(None)
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let prompt = if let Some(ref path) = cli.prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt from {path:?}"))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder().api_timeout_secs(cli.timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(prompt) = prompt {
        builder = builder.prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

/// Print results as JSON or an aligned table.
fn print_output(cli: &Cli, output: &ExtractionOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
        return Ok(());
    }

    if output.records.is_empty() {
        writeln!(handle, "No records extracted.").ok();
        return Ok(());
    }

    let label_width = output
        .records
        .iter()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0)
        .max("LABEL".len());
    let value_width = output
        .records
        .iter()
        .map(|r| r.value.len())
        .max()
        .unwrap_or(0)
        .max("VALUE".len());

    writeln!(
        handle,
        "{}  {}  {}",
        bold(&format!("{:label_width$}", "LABEL")),
        bold(&format!("{:value_width$}", "VALUE")),
        bold("REMARKS"),
    )
    .ok();

    for record in &output.records {
        writeln!(
            handle,
            "{:label_width$}  {:value_width$}  {}",
            record.label,
            record.value,
            dim(&record.remarks),
        )
        .context("Failed to write to stdout")?;
    }

    Ok(())
}

//! # img2facts
//!
//! Extract labeled facts from document images using Vision Language Models.
//!
//! ## Why this crate?
//!
//! Classical OCR turns a scanned invoice into a wall of text; the useful
//! part — *which* fields the document contains and *what* they say — still
//! has to be dug out. This crate sends the image to a vision model and
//! defensively recovers a flat list of `{label, value, remarks}` facts from
//! the model's free-form reply. When no model is available, a regex/entity
//! pattern pipeline extracts the common fields (dates, amounts, reference
//! numbers, emails, phone numbers) from OCR text instead.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Prepare   validate, downscale to ≤2048px, re-encode JPEG
//!  ├─ 2. Dispatch  one call to openrouter / openai / gemini
//!  ├─ 3. Parse     fence-strip, bracket-slice, repair-and-parse JSON
//!  └─ 4. Normalize trim fields, drop entries without label+value
//!
//! OCR text ──▶ Pattern pipeline (line scan + 5 document detectors)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2facts::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENROUTER_API_KEY / OPENAI_API_KEY /
//!     // GEMINI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let output = extract("invoice.png", &config).await?;
//!     for record in &output.records {
//!         println!("{}: {}", record.label, record.value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! No API key at all? The pattern pipeline works offline:
//!
//! ```rust
//! let output = img2facts::extract_text("Invoice #: INV-42\nTotal: $12.00");
//! assert!(output.records.iter().any(|r| r.label == "Amount"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2facts` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2facts = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod provider;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use extract::{extract, extract_sync, extract_text, extract_text_with};
pub use output::{ExtractionOutput, ExtractionStats, Record};
pub use pipeline::patterns::{EntityRecognizer, NoopRecognizer};
pub use provider::{Provider, ProviderDescriptor, ProviderRegistry, ProviderTransport};

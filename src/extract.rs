//! Extraction entry points.
//!
//! Two independent paths share one output contract (an ordered list of
//! [`Record`]s):
//!
//! * **AI path** ([`extract`]) — prepare the image, dispatch it to a vision
//!   provider, recover the JSON array from the reply, normalize.
//! * **Pattern path** ([`extract_text`]) — regex/entity scanning over OCR
//!   text; no provider, no network, never fails.
//!
//! Dispatch errors propagate unchanged: they are not recoverable inside the
//! engine, and a caller must be able to tell "nothing found" (empty record
//! list) from "reply not understood" (parse error).

use crate::config::{ExtractionConfig, PROVIDER_ENV_VAR};
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats, Record};
use crate::pipeline::patterns::{EntityRecognizer, NoopRecognizer};
use crate::pipeline::{image, normalize, parse, patterns};
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use crate::provider::Provider;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract labeled facts from a document image via a vision provider.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `image_path` — Local path to a PNG/JPEG/GIF/TIFF/BMP document image
/// * `config` — Extraction configuration
///
/// # Errors
/// Image preparation, provider resolution, dispatch, and reply parsing
/// errors all propagate as [`ExtractError`]. An image over the size limit
/// fails before any network call. A parseable reply with only malformed
/// entries is NOT an error — it yields an empty record list.
pub async fn extract(
    image_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let path = image_path.as_ref();
    info!("Starting extraction: {}", path.display());

    // ── Step 1: Prepare the image ────────────────────────────────────────
    let prepare_start = Instant::now();
    let prepared = image::prepare_image(path, config.max_image_bytes, config.max_dimension)?;
    let prepare_duration_ms = prepare_start.elapsed().as_millis() as u64;
    debug!(
        "Prepared {}x{} image in {}ms",
        prepared.width(),
        prepared.height(),
        prepare_duration_ms
    );

    // ── Step 2: Resolve the provider ─────────────────────────────────────
    let provider = resolve_provider(config)?;
    let prompt = config.prompt.as_deref().unwrap_or(DEFAULT_EXTRACTION_PROMPT);

    // ── Step 3: Dispatch ─────────────────────────────────────────────────
    let dispatch_start = Instant::now();
    let reply = provider.dispatch(prompt, &prepared).await?;
    let dispatch_duration_ms = dispatch_start.elapsed().as_millis() as u64;
    info!(
        "Provider '{}' answered in {}ms ({} bytes)",
        provider.key(),
        dispatch_duration_ms,
        reply.len()
    );

    // ── Step 4: Parse and normalize ──────────────────────────────────────
    let entries = parse::parse_reply(&reply)?;
    let records = normalize::normalize(&entries);
    info!(
        "Extracted {} records ({} raw entries)",
        records.len(),
        entries.len()
    );

    let stats = ExtractionStats {
        provider: provider.key().to_string(),
        model: provider.model_name().to_string(),
        record_count: records.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        prepare_duration_ms,
        dispatch_duration_ms,
        reply_bytes: reply.len(),
    };

    Ok(ExtractionOutput { records, stats })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    image_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(image_path, config))
}

/// Extract labeled facts from OCR text via the pattern pipeline.
///
/// Never fails; text without matches yields an empty record list.
pub fn extract_text(text: &str) -> ExtractionOutput {
    extract_text_with(text, &NoopRecognizer)
}

/// [`extract_text`] with a caller-supplied entity recognizer for the
/// per-line pass.
pub fn extract_text_with(text: &str, recognizer: &dyn EntityRecognizer) -> ExtractionOutput {
    let start = Instant::now();
    let records: Vec<Record> = patterns::scan_text(text, recognizer);

    let stats = ExtractionStats {
        provider: "pattern".to_string(),
        model: "-".to_string(),
        record_count: records.len(),
        total_duration_ms: start.elapsed().as_millis() as u64,
        ..Default::default()
    };

    ExtractionOutput { records, stats }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the provider, from most-specific to least-specific.
///
/// 1. **Explicit key** (`config.provider`) — the caller chose.
/// 2. **Environment override** (`IMG2FACTS_PROVIDER`) — chosen at the
///    execution-environment level (shell script, CI).
/// 3. **Auto-detection** — the first registered provider whose credential
///    variable is set.
/// 4. **Default** — the registry's first entry; connecting without its
///    credential fails with [`ExtractError::MissingCredential`], which
///    names the variable to set.
fn resolve_provider(config: &ExtractionConfig) -> Result<Provider, ExtractError> {
    let key = if let Some(ref key) = config.provider {
        key.clone()
    } else if let Some(key) = std::env::var(PROVIDER_ENV_VAR)
        .ok()
        .filter(|v| !v.is_empty())
    {
        key
    } else if let Some(key) = config.registry.detect() {
        key.to_string()
    } else {
        config
            .registry
            .keys()
            .first()
            .map(|k| k.to_string())
            .ok_or_else(|| ExtractError::InvalidConfig("provider registry is empty".into()))?
    };

    config
        .registry
        .connect(&key, config.model.as_deref(), config.api_timeout_secs)
}

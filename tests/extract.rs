//! End-to-end integration tests for img2facts.
//!
//! The pattern-path and image-validation tests run everywhere with no
//! credentials. Tests that make live provider calls are gated behind the
//! `E2E_ENABLED` environment variable plus the relevant API key, so they do
//! not run in CI unless explicitly requested.
//!
//! Run with:
//!   cargo test --test extract -- --nocapture
//!
//! To include live provider tests:
//!   E2E_ENABLED=1 OPENROUTER_API_KEY=sk-or-... cargo test --test extract -- --nocapture

use img2facts::{extract, extract_text, ExtractionConfig, ExtractError, Record};
use image::{Rgb, RgbImage};
use std::io::Write;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn save_test_image(width: u32, height: u32) -> tempfile::TempPath {
    let img = RgbImage::from_pixel(width, height, Rgb([245, 245, 245]));
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    img.save(file.path()).unwrap();
    file.into_temp_path()
}

fn has_record(records: &[Record], label: &str, value: &str) -> bool {
    records.iter().any(|r| r.label == label && r.value == value)
}

/// Assert the output satisfies the library's core contract.
fn assert_output_contract(records: &[Record], context: &str) {
    for r in records {
        assert!(
            !r.label.trim().is_empty(),
            "[{context}] record with blank label: {r:?}"
        );
        assert!(
            !r.value.trim().is_empty(),
            "[{context}] record with blank value: {r:?}"
        );
    }
}

// ── Pattern-path tests (offline, always run) ─────────────────────────────────

#[test]
fn test_invoice_text_yields_expected_records() {
    let text = "Invoice #: INV-2024-001\nTotal: $1,650.00\nEmail: john@example.com";
    let output = extract_text(text);
    let records = &output.records;

    assert_output_contract(records, "invoice-text");

    assert!(has_record(records, "Invoice #", "INV-2024-001"), "{records:?}");
    assert!(has_record(records, "Total", "$1,650.00"));
    assert!(has_record(records, "Amount", "$1,650.00"));
    assert!(has_record(records, "Email", "john@example.com"));
    assert!(
        records
            .iter()
            .any(|r| r.label == "Reference Number" && r.value.starts_with("INV")),
        "{records:?}"
    );
}

#[test]
fn test_repeated_amount_is_deduplicated() {
    let output = extract_text("Deposit: $1,500.00\nBalance due $1,500.00");
    let amounts: Vec<&Record> = output
        .records
        .iter()
        .filter(|r| r.label == "Amount" && r.value == "$1,500.00")
        .collect();
    assert_eq!(amounts.len(), 1, "{:?}", output.records);
}

#[test]
fn test_empty_text_yields_empty_records_not_error() {
    let output = extract_text("");
    assert!(output.records.is_empty());
    assert_eq!(output.stats.record_count, 0);
    assert_eq!(output.stats.provider, "pattern");
}

#[test]
fn test_pattern_output_is_json_serialisable() {
    let output = extract_text("Date: 01/02/2024\nPhone: 555-123-4567");
    let json = serde_json::to_string_pretty(&output).expect("output must serialise");
    let back: img2facts::ExtractionOutput =
        serde_json::from_str(&json).expect("JSON must deserialise back");
    assert_eq!(back.records, output.records);
}

// ── Image-validation tests (no credentials, no network, always run) ──────────

#[tokio::test]
async fn test_oversized_image_fails_before_any_network_call() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(&vec![0u8; 4096]).unwrap();

    // A registry pointing at an unreachable endpoint would fail loudly if
    // dispatch were attempted; the size check must reject first.
    let config = ExtractionConfig::builder()
        .max_image_bytes(1024)
        .build()
        .unwrap();

    let err = extract(file.path(), &config).await.unwrap_err();
    assert!(
        matches!(err, ExtractError::ImageTooLarge { size: 4096, .. }),
        "expected ImageTooLarge, got {err:?}"
    );
}

#[tokio::test]
async fn test_missing_image_is_image_not_found() {
    let config = ExtractionConfig::default();
    let err = extract("/no/such/scan.png", &config).await.unwrap_err();
    assert!(matches!(err, ExtractError::ImageNotFound { .. }));
}

#[tokio::test]
async fn test_unknown_provider_is_rejected_after_image_prep() {
    let path = save_test_image(32, 32);
    let config = ExtractionConfig::builder()
        .provider("not-a-backend")
        .build()
        .unwrap();

    let err = extract(&path, &config).await.unwrap_err();
    match err {
        ExtractError::UnknownProvider { key, .. } => assert_eq!(key, "not-a-backend"),
        other => panic!("expected UnknownProvider, got {other:?}"),
    }
}

#[test]
fn test_default_limits_match_documented_constraints() {
    let config = ExtractionConfig::default();
    assert_eq!(config.max_image_bytes, 15 * 1024 * 1024);
    assert_eq!(config.max_dimension, 2048);
    assert_eq!(config.api_timeout_secs, 60);
}

// ── Live provider tests (gated) ──────────────────────────────────────────────

fn e2e_enabled() -> bool {
    std::env::var("E2E_ENABLED").is_ok()
}

fn test_image_path() -> Option<PathBuf> {
    let p = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/sample_invoice.png");
    p.exists().then_some(p)
}

/// Gated e2e: full AI path through OpenRouter.
///
/// Requires `E2E_ENABLED=1`, `OPENROUTER_API_KEY`, and
/// `test_cases/sample_invoice.png`.
#[tokio::test]
async fn test_openrouter_extraction() {
    if !e2e_enabled() || std::env::var("OPENROUTER_API_KEY").is_err() {
        println!("SKIP — set E2E_ENABLED=1 and OPENROUTER_API_KEY to run");
        return;
    }
    let Some(path) = test_image_path() else {
        println!("SKIP — test_cases/sample_invoice.png not found");
        return;
    };

    let config = ExtractionConfig::builder()
        .provider("openrouter")
        .build()
        .expect("valid config");

    let output = extract(&path, &config)
        .await
        .expect("OpenRouter extraction must succeed");

    assert_output_contract(&output.records, "openrouter");
    assert_eq!(output.stats.provider, "openrouter");
    assert!(output.stats.reply_bytes > 0);

    println!(
        "[openrouter] {} records in {}ms:",
        output.records.len(),
        output.stats.total_duration_ms
    );
    for r in &output.records {
        println!("  {} = {}  ({})", r.label, r.value, r.remarks);
    }
}

/// Gated e2e: full AI path through the Gemini native client.
///
/// Requires `E2E_ENABLED=1`, `GEMINI_API_KEY`, and
/// `test_cases/sample_invoice.png`.
#[tokio::test]
async fn test_gemini_native_extraction() {
    if !e2e_enabled() || std::env::var("GEMINI_API_KEY").is_err() {
        println!("SKIP — set E2E_ENABLED=1 and GEMINI_API_KEY to run");
        return;
    }
    let Some(path) = test_image_path() else {
        println!("SKIP — test_cases/sample_invoice.png not found");
        return;
    };

    let config = ExtractionConfig::builder()
        .provider("gemini")
        .build()
        .expect("valid config");

    let output = extract(&path, &config)
        .await
        .expect("Gemini extraction must succeed");

    assert_output_contract(&output.records, "gemini");
    assert_eq!(output.stats.provider, "gemini");

    println!("[gemini] {} records", output.records.len());
}

/// Gated e2e: an invalid credential must classify as Unauthorized, not a
/// generic provider error.
#[tokio::test]
async fn test_bad_credential_classifies_as_unauthorized() {
    if !e2e_enabled() {
        println!("SKIP — set E2E_ENABLED=1 to run");
        return;
    }

    std::env::set_var("IMG2FACTS_E2E_BAD_KEY", "sk-or-invalid-credential");
    let registry = img2facts::ProviderRegistry::from_descriptors(vec![
        img2facts::ProviderDescriptor {
            key: "openrouter-bad".into(),
            model_name: "qwen/qwen2.5-vl-72b-instruct".into(),
            transport: img2facts::ProviderTransport::HostedChat {
                endpoint: "https://openrouter.ai/api/v1/chat/completions".into(),
            },
            credential_env_var: "IMG2FACTS_E2E_BAD_KEY".into(),
        },
    ]);

    let path = save_test_image(32, 32);
    let config = ExtractionConfig::builder()
        .provider("openrouter-bad")
        .registry(registry)
        .build()
        .expect("valid config");

    let err = extract(&path, &config).await.unwrap_err();
    assert!(
        matches!(err, ExtractError::Unauthorized { .. }),
        "expected Unauthorized, got {err:?}"
    );
}

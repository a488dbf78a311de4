//! Pattern extraction: the regex fallback pipeline for raw OCR text.
//!
//! Used when no AI provider is configured. Two passes over the text:
//!
//! 1. **Per line** — an entity recognizer (an external collaborator behind
//!    the [`EntityRecognizer`] trait) plus a `label: value` shape test.
//!    A line may contribute records from both detectors.
//! 2. **Whole document** — five independent detectors (date, currency
//!    amount, reference number, email, phone), each appending a record
//!    under a fixed category label unless a record with that exact
//!    `(label, value)` pair already exists.
//!
//! Dedup is scoped per category only. A value matching two categories
//! appears twice, once under each label — observed behaviour of the
//! detectors, kept as-is; unifying it is a candidate for a future pass.
//!
//! This pipeline never fails: text with no matches yields an empty list.

use crate::output::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// External named-entity collaborator consumed by the per-line pass.
///
/// Implementations typically wrap an NER model and return one record per
/// entity with the entity type as `label`, the matched text as `value`,
/// and a confidence note in `remarks`.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, line: &str) -> Vec<Record>;
}

/// Recognizer that finds nothing; used when no NER backend is wired in.
pub struct NoopRecognizer;

impl EntityRecognizer for NoopRecognizer {
    fn recognize(&self, _line: &str) -> Vec<Record> {
        Vec::new()
    }
}

// ── Patterns ─────────────────────────────────────────────────────────────

static RE_KEY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:]+):\s*(.+)$").unwrap());

static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b").unwrap());

static RE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\s*\d+(?:,\d{3})*(?:\.\d{2})?\b").unwrap());

static RE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:INV|INVOICE|ORDER|PO)[:#-]?\s*\d+\b").unwrap());

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static RE_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\+\d{1,3}[-.]?)?\(?\d{3}\)?[-.]?\d{3}[-.]?\d{4}\b").unwrap());

/// The five document-level detectors: category label, pattern, remark.
static DETECTORS: &[(&str, &Lazy<Regex>, &str)] = &[
    ("Date", &RE_DATE, "Date format detected"),
    ("Amount", &RE_AMOUNT, "Currency amount detected"),
    ("Reference Number", &RE_REFERENCE, "Invoice/Order number detected"),
    ("Email", &RE_EMAIL, "Email address detected"),
    ("Phone", &RE_PHONE, "Phone number detected"),
];

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Run the full pattern pipeline over OCR text.
///
/// Returns per-line records first (in line order), then document-level
/// detector records, in detector order.
pub fn scan_text(text: &str, recognizer: &dyn EntityRecognizer) -> Vec<Record> {
    let mut records = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        records.extend(recognizer.recognize(line));

        if let Some(caps) = RE_KEY_VALUE.captures(line) {
            records.push(Record::new(
                caps[1].trim(),
                caps[2].trim(),
                "Key-value pair",
            ));
        }
    }

    for &(category, pattern, remark) in DETECTORS {
        for m in pattern.find_iter(text) {
            push_unique(&mut records, category, m.as_str().trim(), remark);
        }
    }

    debug!("Pattern pipeline produced {} records", records.len());
    records
}

/// Append a detector record unless its `(label, value)` pair already exists.
fn push_unique(records: &mut Vec<Record>, label: &str, value: &str, remarks: &str) {
    if !records.iter().any(|r| r.label == label && r.value == value) {
        records.push(Record::new(label, value, remarks));
    }
}

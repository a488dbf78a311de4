//! Output types: extracted records and per-run statistics.
//!
//! A [`Record`] is a single labeled fact. Records are transient — created per
//! extraction call, never persisted, never shared across calls. The library
//! guarantees that any `Record` it surfaces has a non-empty `label` and
//! `value` after whitespace trimming (see
//! [`crate::pipeline::normalize`]); `remarks` may be empty.

use serde::{Deserialize, Serialize};

/// A single extracted fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// What the fact is (e.g. "Invoice Number", "Total", "Email").
    pub label: String,
    /// The fact itself, verbatim from the document.
    pub value: String,
    /// Provenance or confidence note (e.g. "Date format detected"). May be empty.
    #[serde(default)]
    pub remarks: String,
}

impl Record {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        remarks: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            remarks: remarks.into(),
        }
    }
}

/// Result of one extraction call: the ordered records plus run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub records: Vec<Record>,
    pub stats: ExtractionStats,
}

/// Statistics for a single extraction run.
///
/// `dispatch_duration_ms` and `reply_bytes` are zero on the pattern path,
/// which makes no network call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Provider key the run used ("pattern" for the regex pipeline).
    pub provider: String,
    /// Model name the provider advertised ("-" for the pattern pipeline).
    pub model: String,
    /// Records surfaced after normalization.
    pub record_count: usize,
    /// Wall-clock time for the whole call.
    pub total_duration_ms: u64,
    /// Time spent decoding/resizing/re-encoding the source image.
    pub prepare_duration_ms: u64,
    /// Time spent in the outbound provider call.
    pub dispatch_duration_ms: u64,
    /// Size of the raw model reply in bytes.
    pub reply_bytes: usize,
}

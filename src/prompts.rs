//! Extraction prompt for vision-model document understanding.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is asked to
//!    return (e.g. adding a field) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    calling a real model.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::prompt`]; the constant here is used
//! only when no override is provided.
//!
//! The response contract is intentionally strict (JSON array only, no
//! fences, no prose) — and intentionally not trusted: hosted models violate
//! it routinely, which is why [`crate::pipeline::parse`] exists.

/// Default prompt for extracting labeled facts from a document image.
///
/// Used when `ExtractionConfig::prompt` is `None`.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"You are an expert document analyst. Examine this document image and extract every piece of structured information you can identify.

Follow these rules precisely:

1. WHAT TO EXTRACT
   - Key-value pairs (e.g. "Invoice Number: 12345")
   - Dates, amounts, reference numbers, email addresses, phone numbers
   - Names of people and organisations
   - Any other clearly labeled field on the document

2. OUTPUT FORMAT
   - Respond with ONLY a JSON array, nothing else
   - Each element must be an object with exactly these keys:
     "label": what the information is
     "value": the information itself, verbatim from the document
     "remarks": any clarifying note, or "" if none
   - Do NOT wrap the array in markdown fences
   - Do NOT add commentary before or after the array

3. ACCURACY
   - Transcribe values exactly as printed; do not reformat dates or numbers
   - If the document is unreadable or contains no structured information,
     respond with an empty array: []"#;

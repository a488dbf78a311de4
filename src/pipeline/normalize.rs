//! Record normalization: validate and trim parsed entries.
//!
//! The parser guarantees a JSON array; it guarantees nothing about the
//! elements. Partial or noisy model output is expected, so a bad element is
//! dropped, not an error — this stage never fails, it only filters.
//! The invariant it enforces is the library's core output contract: a
//! surfaced [`Record`] always has a non-empty `label` and `value` after
//! trimming.

use crate::output::Record;
use serde_json::Value;
use tracing::debug;

/// Filter untyped array entries into clean [`Record`]s, preserving order.
///
/// An entry survives only if it is a JSON object with both a `label` and a
/// `value` key whose trimmed string forms are non-empty. `remarks` defaults
/// to empty. Non-string scalars are accepted by rendering them to their
/// JSON text (a model answering `"value": 100` loses nothing).
pub fn normalize(entries: &[Value]) -> Vec<Record> {
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(map) = entry.as_object() else {
            debug!("Dropping non-object entry: {entry}");
            continue;
        };

        let (Some(label_raw), Some(value_raw)) = (map.get("label"), map.get("value")) else {
            debug!("Dropping entry without label/value keys");
            continue;
        };

        let label = coerce_trimmed(label_raw);
        let value = coerce_trimmed(value_raw);
        if label.is_empty() || value.is_empty() {
            debug!("Dropping entry with blank label or value");
            continue;
        }

        let remarks = map.get("remarks").map(coerce_trimmed).unwrap_or_default();
        records.push(Record {
            label,
            value,
            remarks,
        });
    }

    records
}

/// Render a JSON scalar as its trimmed text form.
fn coerce_trimmed(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

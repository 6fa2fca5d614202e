use serde_json::Value;
use tracing::{debug, warn};

use super::{EnrichmentError, EnrichmentRecord};

/// Extract enrichment records from the LLM's free text.
///
/// Accepts a bare JSON array, one wrapped in a single code fence, or one
/// surrounded by prose. Elements without a usable `index` are dropped.
pub fn parse_enrichment(raw: &str) -> Result<Vec<EnrichmentRecord>, EnrichmentError> {
    let body = strip_code_fence(raw);

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(first_err) => match bracketed(body).map(serde_json::from_str::<Value>) {
            Some(Ok(value)) => value,
            _ => {
                let preview: String = raw.chars().take(500).collect();
                warn!("LLM answer is not JSON: {} (raw: {})", first_err, preview);
                return Err(EnrichmentError::ParseFailed(first_err.to_string()));
            }
        },
    };

    let Value::Array(elements) = value else {
        return Err(EnrichmentError::ParseFailed("expected a JSON array".to_string()));
    };

    let total = elements.len();
    let records: Vec<EnrichmentRecord> = elements.iter().filter_map(record_from_value).collect();
    if records.len() < total {
        debug!("dropped {} enrichment elements without a usable index", total - records.len());
    }
    Ok(records)
}

/// Remove one leading fence (with optional language tag) and one trailing fence.
fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Slice from the first `[` to the last `]`, if any.
fn bracketed(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

/// Non-negative integers, including integral floats such as `1.0`.
fn index_of(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as usize)
}

fn record_from_value(value: &Value) -> Option<EnrichmentRecord> {
    let obj = value.as_object()?;
    let index = index_of(obj.get("index")?)?;

    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let tags = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(EnrichmentRecord { index, summary, tags })
}

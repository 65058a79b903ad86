//! Pulls the query object out of free-form model output.
//!
//! Models wrap JSON in prose, code fences, or both. A fenced ```` ```json ```` block
//! is preferred; failing that, every balanced top-level `{...}` span is tried,
//! longest first.

use crate::query::error::ExtractionError;
use log::{debug, warn};
use serde_json::{Map, Value};

/// Keys every extracted query object must carry.
pub const REQUIRED_KEYS: [&str; 4] = ["location", "date_from", "date_to", "granularity"];

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

fn parse_query_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) if REQUIRED_KEYS.iter().all(|k| object.contains_key(*k)) => {
            Some(object)
        }
        Ok(_) => {
            debug!("Candidate parsed but lacks required keys");
            None
        }
        Err(e) => {
            debug!("Candidate is not valid JSON: {}", e);
            None
        }
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE_OPEN)? + FENCE_OPEN.len();
    let rest = &text[start..];
    let end = rest.find(FENCE_CLOSE)?;
    Some(rest[..end].trim())
}

/// Returns the byte index of the `}` closing the `{` at `start`, if any.
///
/// Braces inside JSON string literals are ignored.
fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every balanced top-level `{...}` span, left to right.
///
/// An opening brace that never closes is skipped and the scan resumes at the next
/// brace after it.
fn balanced_candidates(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut candidates = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        match matching_brace(bytes, start) {
            Some(end) => {
                candidates.push(&text[start..=end]);
                pos = end + 1;
            }
            None => pos = start + 1,
        }
    }
    candidates
}

/// Extracts the query object from raw model output.
///
/// # Errors
///
/// [`ExtractionError::NoOpeningBrace`] when `raw_text` contains no `{` at all,
/// [`ExtractionError::NoValidObject`] when no candidate parses as an object carrying
/// every key in [`REQUIRED_KEYS`].
///
/// # Examples
///
/// ```
/// use weather_query::extract;
///
/// let raw = r#"Sure! {"location": "Prague", "date_from": "2025-04-20",
///               "date_to": "2025-04-21", "granularity": 60} Anything else?"#;
/// let object = extract(raw).unwrap();
/// assert_eq!(object["location"], "Prague");
/// ```
pub fn extract(raw_text: &str) -> Result<Map<String, Value>, ExtractionError> {
    if let Some(block) = fenced_block(raw_text) {
        if let Some(object) = parse_query_object(block) {
            debug!("Using fenced json block");
            return Ok(object);
        }
        warn!("Fenced json block is unusable, scanning for braces");
    }

    if !raw_text.contains('{') {
        return Err(ExtractionError::NoOpeningBrace);
    }

    let mut candidates = balanced_candidates(raw_text);
    // Stable sort keeps the leftmost of equally long candidates first.
    candidates.sort_by(|a, b| b.len().cmp(&a.len()));
    candidates
        .into_iter()
        .find_map(parse_query_object)
        .ok_or(ExtractionError::NoValidObject)
}

//! Extraction of day plans from free-form model text.
//!
//! The model is asked for a JSON array but often wraps it in prose or code
//! fences. We scan for bracket-balanced `[ … ]` spans (ignoring brackets
//! inside JSON strings) and take the first one that decodes into a non-empty
//! list of day objects. Field typing stays permissive: missing fields become
//! empty, and only the overall shape is enforced.

use serde_json::Value;

use super::GenerationError;
use crate::models::trip::ItineraryDay;

/// Parse model output into itinerary days.
pub fn parse(raw: &str) -> Result<Vec<ItineraryDay>, GenerationError> {
    let mut last_error = None;
    for candidate in BracketedSpans::new(raw) {
        match decode(candidate) {
            Ok(days) => return Ok(days),
            Err(e) => last_error = Some(e),
        }
    }
    Err(GenerationError::UnparsableResponse(
        last_error.unwrap_or_else(|| "no bracketed array found".to_string()),
    ))
}

fn decode(candidate: &str) -> Result<Vec<ItineraryDay>, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| format!("invalid JSON: {e}"))?;
    let Value::Array(items) = value else {
        return Err("top-level value is not an array".to_string());
    };
    if items.is_empty() {
        return Err("array is empty".to_string());
    }
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(format!("day {i} is not an object"));
            }
            serde_json::from_value::<ItineraryDay>(item).map_err(|e| format!("day {i}: {e}"))
        })
        .collect()
}

/// Iterator over top-level bracket-balanced spans, in order of appearance.
struct BracketedSpans<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> BracketedSpans<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for BracketedSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let start = self.pos + self.text[self.pos..].find('[')?;
            match matching_close(bytes, start) {
                Some(end) => {
                    self.pos = end + 1;
                    return Some(&self.text[start..=end]);
                }
                // Unclosed: an opener in prose. Try the next one.
                None => self.pos = start + 1,
            }
        }
        None
    }
}

/// Index of the `]` closing the `[` at `start`, honouring JSON string escapes.
fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
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
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

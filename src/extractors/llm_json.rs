use log::{debug, warn};
use serde_json::Value;

use crate::error::ScrapeError;

/// Decode the model's text output as JSON.
///
/// The output is decoded directly first. Models occasionally wrap the JSON in
/// prose or code fences, so the first balanced `{...}` span is tried next.
pub fn parse_model_output(text: &str) -> Result<Value, ScrapeError> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => return Ok(value),
        Err(e) => debug!("Direct JSON decode failed: {}", e),
    }

    if let Some(span) = find_json_object(text) {
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return Ok(value),
            Err(e) => debug!("Embedded JSON decode failed: {}", e),
        }
    }

    warn!("Model returned undecodable output: {}", truncate(text, 200));
    Err(ScrapeError::Parse(
        "AI returned an unreadable format.".to_string(),
    ))
}

/// Locate the first top-level `{...}` span by brace matching.
///
/// Braces inside JSON strings are ignored. Returns `None` when no opening
/// brace has a matching close.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Pull a JSON value of a known shape out of free-text model output.
//!
//! Models wrap JSON in prose and markdown fences. Extraction tries, in order:
//! a fenced code block whose body has the expected shape, then every
//! bracket-matched candidate in the raw text. The first candidate that
//! deserializes into the target type wins.

use crate::error::{ExtractError, JsonShape};
use serde::de::DeserializeOwned;

/// Extract the first JSON value of `shape` from `text` and deserialize it.
///
/// Returns `ExtractError::NotFound` when no bracket-balanced candidate of the
/// right shape exists, and `ExtractError::Malformed` (carrying the error of
/// the first candidate) when candidates exist but none deserialize.
pub fn extract_json<T: DeserializeOwned>(text: &str, shape: JsonShape) -> Result<T, ExtractError> {
    let mut first_error: Option<serde_json::Error> = None;

    for candidate in fenced_blocks(text)
        .into_iter()
        .filter(|body| starts_with_shape(body, shape))
        .chain(balanced_candidates(text, shape))
    {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(source) => Err(ExtractError::Malformed { shape, source }),
        None => Err(ExtractError::NotFound { shape }),
    }
}

fn starts_with_shape(body: &str, shape: JsonShape) -> bool {
    let open = match shape {
        JsonShape::Array => '[',
        JsonShape::Object => '{',
    };
    body.trim_start().starts_with(open)
}

/// Bodies of ``` fenced blocks, with an optional language tag stripped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        // Skip an info string ("json", "JSON", ...) if the first line is one
        let body_start = match after.find('\n') {
            Some(i) if after[..i].trim().chars().all(|c| c.is_ascii_alphanumeric()) => i + 1,
            _ => 0,
        };
        let body = &after[body_start..];
        match body.find("```") {
            Some(end) => {
                blocks.push(body[..end].trim());
                rest = &body[end + 3..];
            }
            None => break,
        }
    }

    blocks
}

/// Every top-level bracket-balanced substring opening with the shape's
/// bracket, in order of appearance. Scanning resumes after each candidate's
/// closing bracket, so values nested inside a candidate are never yielded on
/// their own. String literals are respected so that brackets inside quoted
/// values do not affect nesting.
fn balanced_candidates(text: &str, shape: JsonShape) -> impl Iterator<Item = &str> {
    let (open, close) = match shape {
        JsonShape::Array => (b'[', b']'),
        JsonShape::Object => (b'{', b'}'),
    };
    let bytes = text.as_bytes();
    let mut search_from = 0usize;

    std::iter::from_fn(move || {
        while search_from < bytes.len() {
            let start = search_from + bytes[search_from..].iter().position(|&b| b == open)?;
            match matching_close(bytes, start, open, close) {
                Some(end) => {
                    search_from = end + 1;
                    return Some(&text[start..=end]);
                }
                None => search_from = start + 1,
            }
        }
        None
    })
}

fn matching_close(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
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

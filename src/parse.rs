//! Parsing of loosely-structured model output.
//!
//! The generation wire format is pipe-delimited text (`"source|target"`,
//! optionally `"source|target|context"`). Models occasionally wrap replies in
//! markdown headings, emphasis markers, or code fences; everything here
//! tolerates that. Fewer than two usable fields is a typed error so callers
//! can route to their fallback path instead of guessing.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
  #[error("expected at least 2 '|'-separated fields, got {0}")]
  TooFewFields(usize),
  #[error("empty model response")]
  Empty,
}

/// Drop markdown heading/emphasis markers (`#`, `*`) wherever they appear.
fn strip_markdown_markers(raw: &str) -> String {
  raw.chars().filter(|c| !matches!(c, '#' | '*')).collect()
}

/// Parse a pipe-delimited model reply into trimmed, non-empty fields.
/// At least two fields are required; extras are preserved in order.
pub fn split_fields(raw: &str) -> Result<Vec<String>, WireError> {
  let cleaned = strip_markdown_markers(raw.trim());
  if cleaned.is_empty() {
    return Err(WireError::Empty);
  }
  let fields: Vec<String> = cleaned
    .split('|')
    .map(|p| p.trim().to_string())
    .filter(|p| !p.is_empty())
    .collect();
  if fields.len() < 2 {
    return Err(WireError::TooFewFields(fields.len()));
  }
  Ok(fields)
}

/// Strip ```json ... ``` (or bare ```) fences so the payload can be decoded.
/// Story generation and answer judging both ask for strict JSON, but models
/// still fence it now and then.
pub fn strip_code_fences(raw: &str) -> String {
  let s = raw.trim();
  let s = s.strip_prefix("```json").or_else(|| s.strip_prefix("```")).unwrap_or(s);
  let s = s.strip_suffix("```").unwrap_or(s);
  s.trim().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_two_fields() {
    let fields = split_fields("Akabando k'iminsi gacibwa kare|A walking stick for old age is prepared in advance").unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0], "Akabando k'iminsi gacibwa kare");
  }

  #[test]
  fn markdown_noise_is_stripped() {
    let fields = split_fields("## **Umusozi w'u Rwanda** | A Rwandan hill").unwrap();
    assert_eq!(fields[0], "Umusozi w'u Rwanda");
    assert_eq!(fields[1], "A Rwandan hill");
  }

  #[test]
  fn third_field_survives() {
    let fields = split_fields("a|b|some context").unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[2], "some context");
  }

  #[test]
  fn too_few_fields_is_an_error() {
    assert_eq!(split_fields("just one field"), Err(WireError::TooFewFields(1)));
    assert_eq!(split_fields("   "), Err(WireError::Empty));
    // A stray trailing pipe does not fabricate a second field.
    assert_eq!(split_fields("only|"), Err(WireError::TooFewFields(1)));
  }

  #[test]
  fn fence_stripping() {
    let raw = "```json\n{\"title\": \"Urugendo\"}\n```";
    assert_eq!(strip_code_fences(raw), "{\"title\": \"Urugendo\"}");
    assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
  }
}

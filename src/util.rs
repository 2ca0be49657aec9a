//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Normalize an answer for exact comparison: lowercase, drop everything that
/// is not alphanumeric or whitespace, then collapse whitespace runs.
/// `"  Amazi!"` and `"amazi"` normalize to the same string.
pub fn normalize_answer(s: &str) -> String {
  let stripped: String = s
    .to_lowercase()
    .chars()
    .filter(|c| c.is_alphanumeric() || c.is_whitespace())
    .collect();
  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a numeric difficulty to the proficiency word used in prompts.
/// Out-of-range values read as intermediate.
pub fn difficulty_word(difficulty: u8) -> &'static str {
  match difficulty {
    1 => "beginner",
    3 => "advanced",
    _ => "intermediate",
  }
}

/// Clamp a requested difficulty into the supported 1..=3 range.
pub fn clamp_difficulty(difficulty: u8) -> u8 {
  difficulty.clamp(1, 3)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_punctuation_case_and_spacing() {
    assert_eq!(normalize_answer("  Amazi!"), "amazi");
    assert_eq!(normalize_answer("Mwaramutse,   neza."), "mwaramutse neza");
    assert_eq!(normalize_answer("AMAZI"), normalize_answer("amazi"));
  }

  #[test]
  fn normalize_keeps_distinct_words_distinct() {
    assert_ne!(normalize_answer("ubwoba"), normalize_answer("amazi"));
  }

  #[test]
  fn template_fill_replaces_all_occurrences() {
    let out = fill_template("{word} and {word} at {level}", &[("word", "amazi"), ("level", "beginner")]);
    assert_eq!(out, "amazi and amazi at beginner");
  }

  #[test]
  fn difficulty_mapping() {
    assert_eq!(difficulty_word(1), "beginner");
    assert_eq!(difficulty_word(2), "intermediate");
    assert_eq!(difficulty_word(3), "advanced");
    assert_eq!(difficulty_word(9), "intermediate");
    assert_eq!(clamp_difficulty(0), 1);
    assert_eq!(clamp_difficulty(7), 3);
  }
}

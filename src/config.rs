//! Loading agent configuration (prompt templates) from TOML.
//!
//! See `AgentConfig` and `Prompts` for the expected schema. Every prompt has
//! a built-in default tuned for Kinyarwanda/English, so the TOML file is
//! optional and may override any subset.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the generative backend. Generation templates all demand
/// pipe-delimited output with no extra formatting; story generation and
/// answer judging demand strict JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Challenge generation
  pub challenge_system: String,
  pub proverb_user_template: String,
  pub phrase_user_template: String,
  pub themed_user_template: String,
  pub story_challenge_user_template: String,
  pub image_describe_user: String,
  /// Appended when the session has recent wrong answers; `{answers}` is a
  /// semicolon-separated list.
  pub weak_points_suffix_template: String,
  // Story generation
  pub story_system: String,
  pub story_user: String,
  // Answer judging
  pub eval_system: String,
  pub eval_user_template: String,
  // Riddle hints
  pub hint_system: String,
  pub hint_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      challenge_system: "You are a Kinyarwanda language learning content generator. Respond ONLY in the exact format requested, with fields separated by a pipe (|). No titles, no markdown, no extra text.".into(),
      proverb_user_template: "Provide a {level} Kinyarwanda proverb and its English translation, separated by a pipe (|). You may add a third pipe-separated field with a short cultural note. Example: 'Akabando k'iminsi gacibwa kare|A walking stick for old age is prepared in advance'.".into(),
      phrase_user_template: "Provide a simple {level} English phrase and its Kinyarwanda translation, separated by a pipe (|). Example: 'Good morning|Mwaramutse'.".into(),
      themed_user_template: "Provide a simple English phrase using the word '{word}' and its Kinyarwanda translation, separated by a pipe (|). Example: 'The honey is sweet|Ubuki buraryoshye'.".into(),
      story_challenge_user_template: "Based on this chapter of a story: '{chapter}', create a language challenge. The challenge should be a phrase from the story to translate from English to Kinyarwanda, in the format 'English phrase|Kinyarwanda translation'.".into(),
      image_describe_user: "Describe this image of Rwanda in a single, descriptive sentence. Provide the description in both Kinyarwanda and English, separated by a pipe (|). Example: 'Umusozi w'u Rwanda|A Rwandan hill'.".into(),
      weak_points_suffix_template: "\nThe learner recently answered these incorrectly: {answers}. Prefer material that revisits similar vocabulary.".into(),
      story_system: "You are a storyteller for a language learning game. Respond ONLY with strict JSON.".into(),
      story_user: "Write a short, engaging story about a character exploring Rwanda, broken into 3 chapters that each introduce new vocabulary, in English. Return JSON with a 'title' string and a 'chapters' array of strings. No other text or formatting.".into(),
      eval_system: "You are an expert in Kinyarwanda and English. Respond ONLY with strict JSON.".into(),
      eval_user_template: "The target text is '{target}'. The user's answer is '{answer}'. Is the user's answer a correct translation? Consider synonyms and minor grammatical variations. Return JSON {\"is_correct\": boolean, \"feedback\": string} with one short feedback sentence.".into(),
      hint_system: "You are a Kinyarwanda riddle master. Give ONE short hint (under 15 words) that does NOT reveal the answer.".into(),
      hint_user_template: "The riddle is: '{riddle}'. The answer is: '{answer}'. Hint at the answer without saying it.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to defaults.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "sakwe_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "sakwe_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "sakwe_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_overrides_only_named_prompts() {
    let cfg: AgentConfig = toml::from_str(
      r#"
      [prompts]
      hint_system = "custom hint system"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.hint_system, "custom hint system");
    assert_eq!(cfg.prompts.eval_system, Prompts::default().eval_system);
  }
}

//! Domain models: game modes, challenge kinds/sources, challenges, stories,
//! and evaluation verdicts.

use serde::{Deserialize, Serialize};

/// Which flavor of the game the session is currently playing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
  Translation,
  Story,
  /// Traditional riddle rounds (sakwe/soma call-and-response).
  Sakwe,
  Image,
}

impl Default for GameMode {
  fn default() -> Self { GameMode::Translation }
}

impl GameMode {
  pub const ALL: [GameMode; 4] =
    [GameMode::Story, GameMode::Translation, GameMode::Sakwe, GameMode::Image];

  pub fn as_str(&self) -> &'static str {
    match self {
      GameMode::Translation => "translation",
      GameMode::Story => "story",
      GameMode::Sakwe => "sakwe",
      GameMode::Image => "image",
    }
  }
}

/// What kind of challenge is presented to the user?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
  /// Translate a Kinyarwanda proverb into English.
  KinToEngProverb,
  /// Translate an English phrase into Kinyarwanda.
  EngToKinPhrase,
  /// Translate a phrase drawn from the session's story chapter.
  StoryTranslation,
  /// Translate a sentence built around a word the user just earned.
  ThemedTranslation,
  /// Riddle announcement. The answer pair stays server-side until `soma`.
  GusakuzaInit,
  /// The revealed riddle itself; the answer is the ground truth.
  Gusakuza,
  /// Describe a sample image in Kinyarwanda or English.
  ImageDescription,
}

impl ChallengeKind {
  /// Kinds whose answers are judged by normalized exact match only.
  /// Riddles and proverbs carry cultural ground truth a model must not
  /// "creatively" accept.
  pub fn is_exact_match(&self) -> bool {
    matches!(
      self,
      ChallengeKind::Gusakuza
        | ChallengeKind::StoryTranslation
        | ChallengeKind::KinToEngProverb
        | ChallengeKind::EngToKinPhrase
    )
  }
}

/// Where did the challenge come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSource {
  /// Produced by the generative backend.
  Generated,
  /// Drawn from the riddle bank file.
  RiddleBank,
  /// Built-in deterministic content used when the backend is unavailable.
  StaticFallback,
}

/// One unit of quiz content plus its ground truth.
/// `target_text` is the answer used for evaluation; for `GusakuzaInit` it
/// encodes `"riddle|answer"` and must never reach the client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  pub kind: ChallengeKind,
  pub source: ChallengeSource,
  pub source_text: String,
  pub target_text: String,
  #[serde(default)]
  pub context: Option<String>,
  pub difficulty: u8,
}

/// Multi-chapter narrative generated for story mode. Stored inside the game
/// session as an opaque JSON-encoded string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Story {
  pub title: String,
  pub chapters: Vec<String>,
}

/// Verdict for one submitted answer. Produced fresh per submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
  pub is_correct: bool,
  pub feedback: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exact_match_kinds() {
    assert!(ChallengeKind::Gusakuza.is_exact_match());
    assert!(ChallengeKind::StoryTranslation.is_exact_match());
    assert!(ChallengeKind::KinToEngProverb.is_exact_match());
    assert!(ChallengeKind::EngToKinPhrase.is_exact_match());
    assert!(!ChallengeKind::ThemedTranslation.is_exact_match());
    assert!(!ChallengeKind::ImageDescription.is_exact_match());
  }

  #[test]
  fn game_mode_wire_names() {
    assert_eq!(serde_json::to_string(&GameMode::Sakwe).unwrap(), "\"sakwe\"");
    let m: GameMode = serde_json::from_str("\"image\"").unwrap();
    assert_eq!(m, GameMode::Image);
  }
}

//! Answer evaluation: hybrid exact-match / model-judged, never fallible.
//!
//! Order of precedence: give-up detection, then open-ended acceptance
//! (images), then normalized exact match for kinds with cultural ground
//! truth, then the model judge for nuanced kinds with exact match as the
//! last-resort fallback.

use tracing::{error, instrument};

use crate::config::Prompts;
use crate::domain::{ChallengeKind, Evaluation};
use crate::model::ModelClient;
use crate::parse::strip_code_fences;
use crate::util::{fill_template, normalize_answer};

/// Saying either of these anywhere in an answer forfeits the round.
pub const GIVE_UP_KEYWORDS: [&str; 2] = ["gitore", "ngicyo"];

/// Case-insensitive containment check for the forfeit phrases.
pub fn is_give_up(user_answer: &str) -> bool {
  let lower = user_answer.to_lowercase();
  GIVE_UP_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub struct AnswerEvaluator {
  model: Option<ModelClient>,
  prompts: Prompts,
}

impl AnswerEvaluator {
  pub fn new(model: Option<ModelClient>, prompts: Prompts) -> Self {
    Self { model, prompts }
  }

  #[instrument(level = "info", skip(self, user_answer, target_text), fields(kind = ?kind, answer_len = user_answer.len()))]
  pub async fn evaluate(
    &self,
    user_answer: &str,
    target_text: &str,
    kind: &ChallengeKind,
  ) -> Evaluation {
    if is_give_up(user_answer) {
      return Evaluation {
        is_correct: false,
        feedback: format!("You gave up. The correct answer was: {target_text}"),
      };
    }

    match kind {
      // Open-ended: there is no single ground truth for a picture.
      ChallengeKind::ImageDescription => Evaluation {
        is_correct: true,
        feedback: "Murakoze! Thanks for describing the image.".into(),
      },
      k if k.is_exact_match() => exact_match(user_answer, target_text),
      _ => self.judge(user_answer, target_text).await,
    }
  }

  /// Model-judged path for nuanced kinds. Synonyms and minor grammar slips
  /// are acceptable; parse or backend failure falls back to exact match.
  async fn judge(&self, user_answer: &str, target_text: &str) -> Evaluation {
    let Some(model) = &self.model else {
      return local_fallback(user_answer, target_text);
    };
    let user = fill_template(
      &self.prompts.eval_user_template,
      &[("target", target_text), ("answer", user_answer)],
    );
    match model.complete_json(&self.prompts.eval_system, &user, 0.2).await {
      Ok(raw) => match serde_json::from_str::<Evaluation>(&strip_code_fences(&raw)) {
        Ok(verdict) => verdict,
        Err(e) => {
          error!(target: "challenge", error = %e, "Judge verdict failed to decode; using exact match");
          local_fallback(user_answer, target_text)
        }
      },
      Err(e) => {
        error!(target: "challenge", error = %e, "Judge call failed; using exact match");
        local_fallback(user_answer, target_text)
      }
    }
  }
}

fn exact_match(user_answer: &str, target_text: &str) -> Evaluation {
  let is_correct = normalize_answer(user_answer) == normalize_answer(target_text);
  let feedback = if is_correct {
    "Correct!".to_string()
  } else {
    "Incorrect.".to_string()
  };
  Evaluation { is_correct, feedback }
}

fn local_fallback(user_answer: &str, target_text: &str) -> Evaluation {
  let base = exact_match(user_answer, target_text);
  Evaluation {
    is_correct: base.is_correct,
    feedback: format!("(local match) {}", base.feedback),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn offline() -> AnswerEvaluator {
    AnswerEvaluator::new(None, Prompts::default())
  }

  #[tokio::test]
  async fn give_up_short_circuits_and_reveals_the_answer() {
    let e = offline();
    for answer in ["ngicyo", "NGICYO", "sinzi, gitore"] {
      let v = e.evaluate(answer, "amazi", &ChallengeKind::Gusakuza).await;
      assert!(!v.is_correct);
      assert!(v.feedback.contains("amazi"));
    }
    // Applies to any kind, before any other logic.
    let v = e.evaluate("ngicyo", "anything", &ChallengeKind::ImageDescription).await;
    assert!(!v.is_correct);
    assert!(v.feedback.contains("anything"));
  }

  #[tokio::test]
  async fn riddles_are_judged_by_normalized_exact_match() {
    let e = offline();
    let v = e.evaluate("  Amazi!", "amazi", &ChallengeKind::Gusakuza).await;
    assert!(v.is_correct);
    let v = e.evaluate("ubwoba", "amazi", &ChallengeKind::Gusakuza).await;
    assert!(!v.is_correct);
  }

  #[tokio::test]
  async fn proverbs_and_story_lines_are_exact_match_too() {
    let e = offline();
    let v = e
      .evaluate("mwaramutse", "Mwaramutse", &ChallengeKind::EngToKinPhrase)
      .await;
    assert!(v.is_correct);
    let v = e
      .evaluate("anything else", "Ibitwenge by'abana byumvikanye.", &ChallengeKind::StoryTranslation)
      .await;
    assert!(!v.is_correct);
  }

  #[tokio::test]
  async fn image_descriptions_are_always_accepted() {
    let e = offline();
    let v = e.evaluate("umusozi", "whatever", &ChallengeKind::ImageDescription).await;
    assert!(v.is_correct);
  }

  #[tokio::test]
  async fn nuanced_kinds_fall_back_to_exact_match_when_offline() {
    let e = offline();
    let v = e.evaluate("Ubuki buraryoshye", "Ubuki buraryoshye", &ChallengeKind::ThemedTranslation).await;
    assert!(v.is_correct);
    assert!(v.feedback.starts_with("(local match)"));
    let v = e.evaluate("nope", "Ubuki buraryoshye", &ChallengeKind::ThemedTranslation).await;
    assert!(!v.is_correct);
  }
}

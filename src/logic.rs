//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Each flow is a read-modify-write over one session: fetch a copy, let the
//! generator/evaluator/transition rules mutate it, write it back. Nothing in
//! here knows about axum.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, instrument};

use crate::domain::{Challenge, ChallengeKind, GameMode};
use crate::error::GameError;
use crate::evaluator::is_give_up;
use crate::game::AnswerOutcome;
use crate::generator::ChallengeGenerator;
use crate::state::AppState;
use crate::util::{clamp_difficulty, fill_template};

/// Everything the client needs to render one submission result.
#[derive(Clone, Debug)]
pub struct SubmissionOutcome {
  pub message: String,
  pub is_correct: bool,
  pub correct_answer: String,
  pub feedback: String,
  pub score_awarded: u32,
  pub lives: u8,
  pub score: u32,
  pub game_over: bool,
}

/// Generate and persist the next challenge for the session. Mode/difficulty
/// overrides from the request are applied to the session first.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn next_challenge(
  state: &AppState,
  session_id: &str,
  game_mode: Option<GameMode>,
  difficulty: Option<u8>,
) -> Result<Challenge, GameError> {
  let mut session = state.session(session_id).await;
  if let Some(mode) = game_mode {
    session.game_mode = mode;
  }
  if let Some(d) = difficulty {
    session.difficulty = clamp_difficulty(d);
  }

  let mut rng = StdRng::from_entropy();
  let challenge = state.generator.generate(&mut session, &mut rng).await?;

  // The riddle announcement lives only in the session's pending slot; every
  // other challenge is stored for the answer lookup.
  if challenge.kind != ChallengeKind::GusakuzaInit {
    state.insert_challenge(challenge.clone()).await;
  }
  state.put_session(session_id, session).await;
  info!(target: "challenge", id = %challenge.id, kind = ?challenge.kind, source = ?challenge.source, "Challenge served");
  Ok(challenge)
}

/// The `soma` reveal: turn the pending riddle into a playable challenge.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn soma(state: &AppState, session_id: &str) -> Result<Challenge, GameError> {
  let mut session = state.session(session_id).await;
  let challenge = ChallengeGenerator::reveal_riddle(&mut session)?;
  state.insert_challenge(challenge.clone()).await;
  state.put_session(session_id, session).await;
  info!(target: "challenge", id = %challenge.id, "Riddle revealed");
  Ok(challenge)
}

/// Evaluate a submitted answer and apply the game transition.
#[instrument(level = "info", skip(state, user_answer), fields(%session_id, %challenge_id, answer_len = user_answer.len()))]
pub async fn submit_answer(
  state: &AppState,
  session_id: &str,
  challenge_id: &str,
  user_answer: &str,
) -> Result<SubmissionOutcome, GameError> {
  let challenge = state
    .get_challenge(challenge_id)
    .await
    .ok_or_else(|| GameError::UnknownChallenge(challenge_id.to_string()))?;
  let mut session = state.session(session_id).await;

  let evaluation =
    state.evaluator.evaluate(user_answer, &challenge.target_text, &challenge.kind).await;

  // Forfeits are reported incorrect but cost nothing; the round simply ends.
  if is_give_up(user_answer) {
    return Ok(SubmissionOutcome {
      message: evaluation.feedback.clone(),
      is_correct: false,
      correct_answer: challenge.target_text,
      feedback: evaluation.feedback,
      score_awarded: 0,
      lives: session.lives,
      score: session.score,
      game_over: false,
    });
  }

  let mut rng = StdRng::from_entropy();
  let outcome = session.apply_answer(user_answer, evaluation.is_correct, &challenge, &mut rng);

  let (message, score_awarded, game_over) = match &outcome {
    AnswerOutcome::Correct { score_awarded, milestone } => {
      let mut message = "Correct!".to_string();
      if let Some(m) = milestone {
        message.push_str(&format!(
          " You've unlocked a new game mode: {}! Difficulty increased.",
          title_case(m.new_mode.as_str())
        ));
      }
      (message, *score_awarded, false)
    }
    AnswerOutcome::Incorrect { .. } => ("Incorrect.".to_string(), 0, false),
    AnswerOutcome::GameOver => ("Game Over! You have no lives left.".to_string(), 0, true),
  };

  info!(target: "challenge", id = %challenge.id, correct = evaluation.is_correct, %game_over, "Answer evaluated");
  state.put_session(session_id, session.clone()).await;

  Ok(SubmissionOutcome {
    message,
    is_correct: evaluation.is_correct,
    correct_answer: challenge.target_text,
    feedback: evaluation.feedback,
    score_awarded,
    lives: session.lives,
    score: session.score,
    game_over,
  })
}

/// Model-generated hint for a stored challenge, with a deterministic local
/// fallback. Never reveals the answer.
#[instrument(level = "info", skip(state), fields(%challenge_id))]
pub async fn challenge_hint(state: &AppState, challenge_id: &str) -> Result<String, GameError> {
  let challenge = state
    .get_challenge(challenge_id)
    .await
    .ok_or_else(|| GameError::UnknownChallenge(challenge_id.to_string()))?;

  if let Some(model) = &state.model {
    let user = fill_template(
      &state.prompts.hint_user_template,
      &[("riddle", challenge.source_text.as_str()), ("answer", challenge.target_text.as_str())],
    );
    match model.complete(&state.prompts.hint_system, &user, 0.4).await {
      Ok(text) => return Ok(text),
      Err(e) => {
        error!(target: "challenge", id = %challenge.id, error = %e, "Hint generation failed; using local hint")
      }
    }
  }
  Ok(local_hint(&challenge.target_text))
}

fn local_hint(target_text: &str) -> String {
  let first = target_text.chars().next().map(|c| c.to_lowercase().to_string()).unwrap_or_default();
  let letters = target_text.chars().filter(|c| c.is_alphanumeric()).count();
  format!("The answer begins with '{first}' and has {letters} letters.")
}

fn title_case(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Prompts;
  use crate::domain::ChallengeSource;
  use crate::evaluator::AnswerEvaluator;
  use crate::riddles::{Riddle, RiddleBank};
  use std::collections::HashMap;
  use std::path::PathBuf;
  use std::sync::Arc;
  use tokio::sync::RwLock;

  /// Offline state with a one-riddle bank; no env, no network.
  fn offline_state() -> AppState {
    let prompts = Prompts::default();
    let riddles = Arc::new(RiddleBank::from_riddles(vec![Riddle {
      riddle: "Inshyushyu y'umusambi".into(),
      answer: "amazi".into(),
    }]));
    let image_dir = PathBuf::from("sampleimg");
    AppState {
      challenges: RwLock::new(HashMap::new()),
      sessions: RwLock::new(HashMap::new()),
      generator: ChallengeGenerator::new(None, prompts.clone(), riddles, image_dir.clone()),
      evaluator: AnswerEvaluator::new(None, prompts.clone()),
      model: None,
      prompts,
      image_dir,
    }
  }

  #[tokio::test]
  async fn full_riddle_round_feeds_the_thematic_queue() {
    let state = offline_state();
    let sid = "s1";

    let init = next_challenge(&state, sid, Some(GameMode::Sakwe), None).await.unwrap();
    assert_eq!(init.kind, ChallengeKind::GusakuzaInit);
    // The announcement is not answerable.
    assert!(state.get_challenge(&init.id).await.is_none());

    let riddle = soma(&state, sid).await.unwrap();
    assert_eq!(riddle.kind, ChallengeKind::Gusakuza);
    assert_eq!(riddle.source_text, "Inshyushyu y'umusambi");

    let out = submit_answer(&state, sid, &riddle.id, "  Amazi!").await.unwrap();
    assert!(out.is_correct);
    assert_eq!(out.score, 10);
    assert_eq!(out.score_awarded, 10);

    // The earned word shapes the next round, then the queue is drained.
    let next = next_challenge(&state, sid, Some(GameMode::Translation), None).await.unwrap();
    assert_eq!(next.source, ChallengeSource::StaticFallback);
    let session = state.session(sid).await;
    assert!(session.thematic_words.is_empty());
  }

  #[tokio::test]
  async fn soma_twice_is_a_precondition_error() {
    let state = offline_state();
    let sid = "s2";
    next_challenge(&state, sid, Some(GameMode::Sakwe), None).await.unwrap();
    soma(&state, sid).await.unwrap();
    assert!(matches!(soma(&state, sid).await, Err(GameError::NoPendingRiddle)));
  }

  #[tokio::test]
  async fn three_wrong_answers_reset_the_session() {
    let state = offline_state();
    let sid = "s3";
    for round in 0..3 {
      next_challenge(&state, sid, Some(GameMode::Sakwe), None).await.unwrap();
      let riddle = soma(&state, sid).await.unwrap();
      let out = submit_answer(&state, sid, &riddle.id, "ubwoba").await.unwrap();
      assert!(!out.is_correct);
      if round < 2 {
        assert_eq!(out.lives, 2 - round as u8);
        assert!(!out.game_over);
      } else {
        assert!(out.game_over);
        assert_eq!(out.lives, 3);
        assert_eq!(out.score, 0);
      }
    }
    let session = state.session(sid).await;
    assert!(session.incorrect_answers.is_empty());
    assert!(session.thematic_words.is_empty());
  }

  #[tokio::test]
  async fn giving_up_costs_nothing() {
    let state = offline_state();
    let sid = "s4";
    next_challenge(&state, sid, Some(GameMode::Sakwe), None).await.unwrap();
    let riddle = soma(&state, sid).await.unwrap();
    let out = submit_answer(&state, sid, &riddle.id, "ngicyo").await.unwrap();
    assert!(!out.is_correct);
    assert!(out.message.contains("amazi"));
    assert_eq!(out.lives, 3);
    assert!(!out.game_over);
    let session = state.session(sid).await;
    assert!(session.incorrect_answers.is_empty());
  }

  #[tokio::test]
  async fn unknown_challenge_id_is_a_not_found_error() {
    let state = offline_state();
    match submit_answer(&state, "s5", "missing-id", "x").await {
      Err(GameError::UnknownChallenge(id)) => assert_eq!(id, "missing-id"),
      other => panic!("expected UnknownChallenge, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn hint_never_reveals_the_answer_offline() {
    let state = offline_state();
    let sid = "s6";
    next_challenge(&state, sid, Some(GameMode::Sakwe), None).await.unwrap();
    let riddle = soma(&state, sid).await.unwrap();
    let hint = challenge_hint(&state, &riddle.id).await.unwrap();
    assert!(!hint.contains("amazi"));
    assert!(hint.contains('5'));
  }

  #[test]
  fn local_hint_shape() {
    assert_eq!(local_hint("Amazi"), "The answer begins with 'a' and has 5 letters.");
  }

  #[test]
  fn title_case_for_milestone_messages() {
    assert_eq!(title_case("sakwe"), "Sakwe");
    assert_eq!(title_case(""), "");
  }
}

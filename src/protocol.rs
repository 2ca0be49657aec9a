//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! `ChallengeOut` deliberately has no `target_text`: the ground truth stays
//! server-side (for riddle announcements it encodes the whole riddle pair).

use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, ChallengeKind, ChallengeSource, GameMode};
use crate::game::GameSession;
use crate::logic::SubmissionOutcome;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  NewChallenge {
    #[serde(default, rename = "gameMode")]
    game_mode: Option<GameMode>,
    #[serde(default)]
    difficulty: Option<u8>,
  },
  Soma,
  SubmitAnswer {
    #[serde(rename = "challengeId")]
    challenge_id: String,
    answer: String,
  },
  Hint {
    #[serde(rename = "challengeId")]
    challenge_id: String,
  },
  GetState,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Challenge { challenge: ChallengeOut },
  AnswerResult(SubmissionOut),
  Hint { text: String },
  SessionState { session: SessionOut },
  Error { message: String },
}

/// DTO used by both WS and HTTP for challenge delivery.
#[derive(Debug, Serialize)]
pub struct ChallengeOut {
  #[serde(rename = "challengeId")]
  pub challenge_id: String,
  pub challenge_type: ChallengeKind,
  pub source: ChallengeSource,
  pub source_text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<String>,
  pub difficulty: u8,
}

/// Convert the internal `Challenge` to the public DTO, dropping the answer.
pub fn to_out(c: &Challenge) -> ChallengeOut {
  ChallengeOut {
    challenge_id: c.id.clone(),
    challenge_type: c.kind.clone(),
    source: c.source,
    source_text: c.source_text.clone(),
    context: c.context.clone(),
    difficulty: c.difficulty,
  }
}

/// Submission receipt shared by WS and HTTP.
#[derive(Debug, Serialize)]
pub struct SubmissionOut {
  pub message: String,
  pub is_correct: bool,
  pub correct_answer: String,
  pub feedback: String,
  pub score_awarded: u32,
  pub lives: u8,
  pub score: u32,
  pub game_over: bool,
}

impl From<SubmissionOutcome> for SubmissionOut {
  fn from(o: SubmissionOutcome) -> Self {
    Self {
      message: o.message,
      is_correct: o.is_correct,
      correct_answer: o.correct_answer,
      feedback: o.feedback,
      score_awarded: o.score_awarded,
      lives: o.lives,
      score: o.score,
      game_over: o.game_over,
    }
  }
}

/// Public view of a session; internals like the pending riddle pair stay
/// hidden.
#[derive(Debug, Serialize)]
pub struct SessionOut {
  pub lives: u8,
  pub score: u32,
  pub difficulty: u8,
  pub game_mode: GameMode,
  pub has_pending_riddle: bool,
}

impl From<&GameSession> for SessionOut {
  fn from(s: &GameSession) -> Self {
    Self {
      lives: s.lives,
      score: s.score,
      difficulty: s.difficulty,
      game_mode: s.game_mode,
      has_pending_riddle: s.pending_riddle.is_some(),
    }
  }
}

//
// HTTP request/response DTOs
//

pub fn default_session_id() -> String {
  "default".into()
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
  #[serde(default, rename = "sessionId")]
  pub session_id: Option<String>,
  #[serde(default)]
  pub difficulty: Option<u8>,
  #[serde(default, rename = "gameMode")]
  pub game_mode: Option<GameMode>,
}

#[derive(Debug, Deserialize)]
pub struct SomaIn {
  #[serde(default, rename = "sessionId")]
  pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
  #[serde(default, rename = "sessionId")]
  pub session_id: Option<String>,
  #[serde(rename = "challengeId")]
  pub challenge_id: String,
  pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct HintQuery {
  #[serde(rename = "challengeId")]
  pub challenge_id: String,
}

#[derive(Serialize)]
pub struct HintOut {
  pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StateQuery {
  #[serde(default, rename = "sessionId")]
  pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ChallengeSource;

  #[test]
  fn challenge_out_never_carries_the_answer() {
    let c = Challenge {
      id: "gusakuza_init".into(),
      kind: ChallengeKind::GusakuzaInit,
      source: ChallengeSource::RiddleBank,
      source_text: "Sakwe sakwe!".into(),
      target_text: "secret riddle|secret answer".into(),
      context: None,
      difficulty: 1,
    };
    let json = serde_json::to_string(&to_out(&c)).unwrap();
    assert!(!json.contains("secret"));
    assert!(json.contains("gusakuza_init"));
  }

  #[test]
  fn client_messages_decode_from_snake_case_tags() {
    let msg: ClientWsMessage =
      serde_json::from_str(r#"{"type": "new_challenge", "gameMode": "sakwe"}"#).unwrap();
    match msg {
      ClientWsMessage::NewChallenge { game_mode, difficulty } => {
        assert_eq!(game_mode, Some(GameMode::Sakwe));
        assert!(difficulty.is_none());
      }
      other => panic!("unexpected message: {other:?}"),
    }
    let msg: ClientWsMessage = serde_json::from_str(r#"{"type": "soma"}"#).unwrap();
    assert!(matches!(msg, ClientWsMessage::Soma));
  }
}

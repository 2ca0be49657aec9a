//! Caller-visible error taxonomy.
//!
//! Everything recoverable (a model candidate failing, malformed model output)
//! is handled inside the generator/evaluator and never shows up here. What
//! remains is the small set of conditions the transport layer must present to
//! the user: a resource with no safe fallback, and protocol preconditions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
  /// No safe fallback exists (empty riddle bank, empty image directory).
  #[error("{0}")]
  ResourceUnavailable(String),
  /// `soma` was called without a preceding riddle announcement.
  #[error("No pending riddle. Start a new round with game_mode=sakwe.")]
  NoPendingRiddle,
  /// The stored pending riddle did not contain a `riddle|answer` pair.
  #[error("Pending riddle was malformed; start a new round.")]
  PendingRiddleCorrupt,
  /// Answer submitted against an id the challenge store does not know.
  #[error("Unknown challenge id: {0}")]
  UnknownChallenge(String),
}

impl GameError {
  fn status(&self) -> StatusCode {
    match self {
      GameError::ResourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      GameError::NoPendingRiddle | GameError::PendingRiddleCorrupt => StatusCode::BAD_REQUEST,
      GameError::UnknownChallenge(_) => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for GameError {
  fn into_response(self) -> Response {
    let body = Json(serde_json::json!({ "error_message": self.to_string() }));
    (self.status(), body).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_match_error_class() {
    assert_eq!(GameError::ResourceUnavailable("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(GameError::NoPendingRiddle.status(), StatusCode::BAD_REQUEST);
    assert_eq!(GameError::UnknownChallenge("abc".into()).status(), StatusCode::NOT_FOUND);
  }
}

//! HTTP endpoint handlers. Thin wrappers that forward to core logic; game
//! errors map to status codes via `GameError: IntoResponse`.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::GameError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ChallengeQuery>,
) -> Result<Json<ChallengeOut>, GameError> {
  let session_id = q.session_id.unwrap_or_else(default_session_id);
  let challenge = logic::next_challenge(&state, &session_id, q.game_mode, q.difficulty).await?;
  info!(target: "challenge", %session_id, id = %challenge.id, "HTTP challenge served");
  Ok(Json(to_out(&challenge)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_soma(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SomaIn>,
) -> Result<Json<ChallengeOut>, GameError> {
  let session_id = body.session_id.unwrap_or_else(default_session_id);
  let challenge = logic::soma(&state, &session_id).await?;
  info!(target: "challenge", %session_id, id = %challenge.id, "HTTP soma served");
  Ok(Json(to_out(&challenge)))
}

#[instrument(level = "info", skip(state, body), fields(%body.challenge_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<SubmissionOut>, GameError> {
  let session_id = body.session_id.unwrap_or_else(default_session_id);
  let outcome = logic::submit_answer(&state, &session_id, &body.challenge_id, &body.answer).await?;
  info!(target: "challenge", %session_id, id = %body.challenge_id, correct = outcome.is_correct, "HTTP submit_answer evaluated");
  Ok(Json(outcome.into()))
}

#[instrument(level = "info", skip(state), fields(%q.challenge_id))]
pub async fn http_get_hint(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HintQuery>,
) -> Result<Json<HintOut>, GameError> {
  let text = logic::challenge_hint(&state, &q.challenge_id).await?;
  info!(target: "challenge", id = %q.challenge_id, "HTTP hint served");
  Ok(Json(HintOut { text }))
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_get_state(
  State(state): State<Arc<AppState>>,
  Query(q): Query<StateQuery>,
) -> impl IntoResponse {
  let session_id = q.session_id.unwrap_or_else(default_session_id);
  let session = state.session(&session_id).await;
  Json(SessionOut::from(&session))
}

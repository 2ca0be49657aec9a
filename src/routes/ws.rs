//! WebSocket upgrade + message loop. Each client message is parsed as JSON
//! and forwarded to core logic; one JSON reply per request. Every connection
//! plays its own session.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::logic;
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage, SessionOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "sakwe_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = Uuid::new_v4().to_string();
  info!(target: "sakwe_backend", %session_id, "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "sakwe_backend", %session_id, "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &session_id).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) })
            .to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "sakwe_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "sakwe_backend", %session_id, "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, msg), fields(%session_id))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session_id: &str,
) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewChallenge { game_mode, difficulty } => {
      match logic::next_challenge(state, session_id, game_mode, difficulty).await {
        Ok(challenge) => {
          info!(target: "challenge", id = %challenge.id, "WS new_challenge served");
          ServerWsMessage::Challenge { challenge: to_out(&challenge) }
        }
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::Soma => match logic::soma(state, session_id).await {
      Ok(challenge) => {
        info!(target: "challenge", id = %challenge.id, "WS soma served");
        ServerWsMessage::Challenge { challenge: to_out(&challenge) }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::SubmitAnswer { challenge_id, answer } => {
      match logic::submit_answer(state, session_id, &challenge_id, &answer).await {
        Ok(outcome) => {
          info!(target: "challenge", id = %challenge_id, correct = outcome.is_correct, "WS submit_answer evaluated");
          ServerWsMessage::AnswerResult(outcome.into())
        }
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::Hint { challenge_id } => {
      match logic::challenge_hint(state, &challenge_id).await {
        Ok(text) => ServerWsMessage::Hint { text },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::GetState => {
      let session = state.session(session_id).await;
      ServerWsMessage::SessionState { session: SessionOut::from(&session) }
    }
  }
}

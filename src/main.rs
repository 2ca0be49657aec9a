//! Sakwe · Kinyarwanda Quiz Game Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional generative backend with multi-model failover (via env)
//! - Riddle bank + sample images + static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   MODEL_API_KEY     : enables the generative backend if present
//!   MODEL_BASE_URL    : default "https://api.openai.com/v1"
//!   MODEL_CANDIDATES  : ordered failover list, default "gpt-4o-mini,gpt-4o"
//!   AGENT_CONFIG_PATH : path to TOML config (prompt overrides)
//!   RIDDLE_BANK_PATH  : riddle JSON file, default "riddles.json"
//!   SAMPLE_IMAGE_DIR  : image challenge directory, default "sampleimg"
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod parse;
mod domain;
mod error;
mod config;
mod riddles;
mod seeds;
mod model;
mod story;
mod game;
mod generator;
mod evaluator;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (stores, riddle bank, model client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "sakwe_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}

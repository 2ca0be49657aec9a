//! Application state: in-memory stores, the riddle bank, prompts, the
//! optional model client, and the generator/evaluator built once at startup.
//!
//! This module owns:
//!   - the challenge store (by id) for answer lookups
//!   - the session store (by session id)
//!   - construction of `ChallengeGenerator` / `AnswerEvaluator` with their
//!     dependencies injected, so nothing reaches for globals

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::load_agent_config_from_env;
use crate::domain::Challenge;
use crate::evaluator::AnswerEvaluator;
use crate::game::GameSession;
use crate::generator::ChallengeGenerator;
use crate::model::ModelClient;
use crate::riddles::RiddleBank;

pub struct AppState {
  pub challenges: RwLock<HashMap<String, Challenge>>,
  pub sessions: RwLock<HashMap<String, GameSession>>,
  pub generator: ChallengeGenerator,
  pub evaluator: AnswerEvaluator,
  pub model: Option<ModelClient>,
  pub prompts: crate::config::Prompts,
  /// Exposed for the router, which serves the directory statically.
  pub image_dir: PathBuf,
}

impl AppState {
  /// Build state from env: load config, load the riddle bank, init the
  /// model client, wire up the generator and evaluator.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let prompts = load_agent_config_from_env().map(|c| c.prompts).unwrap_or_default();

    let riddle_path =
      PathBuf::from(std::env::var("RIDDLE_BANK_PATH").unwrap_or_else(|_| "riddles.json".into()));
    let riddles = Arc::new(RiddleBank::load(&riddle_path));

    let image_dir =
      PathBuf::from(std::env::var("SAMPLE_IMAGE_DIR").unwrap_or_else(|_| "sampleimg".into()));

    let model = ModelClient::from_env();
    match &model {
      Some(m) => {
        info!(target: "sakwe_backend", candidates = ?m.candidates(), "Model backend enabled")
      }
      None => info!(
        target: "sakwe_backend",
        "Model backend disabled (no MODEL_API_KEY). Serving static fallbacks."
      ),
    }
    info!(
      target: "sakwe_backend",
      riddles = riddles.len(),
      image_dir = %image_dir.display(),
      "Startup content inventory"
    );

    let generator =
      ChallengeGenerator::new(model.clone(), prompts.clone(), riddles, image_dir.clone());
    let evaluator = AnswerEvaluator::new(model.clone(), prompts.clone());

    Self {
      challenges: RwLock::new(HashMap::new()),
      sessions: RwLock::new(HashMap::new()),
      generator,
      evaluator,
      model,
      prompts,
      image_dir,
    }
  }

  /// Store a challenge for later answer lookups.
  pub async fn insert_challenge(&self, c: Challenge) {
    self.challenges.write().await.insert(c.id.clone(), c);
  }

  pub async fn get_challenge(&self, id: &str) -> Option<Challenge> {
    self.challenges.read().await.get(id).cloned()
  }

  /// Fetch a copy of the session, creating defaults for new ids. The caller
  /// mutates the copy and writes it back with `put_session` (read-modify-
  /// write; concurrent requests for one session are not serialized here).
  pub async fn session(&self, id: &str) -> GameSession {
    self.sessions.read().await.get(id).cloned().unwrap_or_default()
  }

  pub async fn put_session(&self, id: &str, session: GameSession) {
    self.sessions.write().await.insert(id.to_string(), session);
  }
}

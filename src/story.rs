//! Story engine: generates the multi-chapter narrative for story mode and
//! keeps it alive inside the game session.
//!
//! The story travels as an opaque JSON-encoded string in `GameSession.story`
//! with `story_chapter` indexing into it. A story is (re)generated whenever
//! the session has none, the stored blob fails to decode, or the chapter
//! pointer has consumed every chapter. Generation never fails outright: a
//! built-in narrative stands in when the backend is exhausted.

use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::Story;
use crate::game::GameSession;
use crate::model::ModelClient;
use crate::parse::strip_code_fences;
use crate::seeds::fallback_story;

fn decode(raw: &str) -> Option<Story> {
  match serde_json::from_str::<Story>(raw) {
    Ok(story) if !story.chapters.is_empty() => Some(story),
    Ok(_) => None,
    Err(e) => {
      warn!(target: "challenge", error = %e, "Stored story failed to decode; regenerating");
      None
    }
  }
}

/// Return the session's story, generating and storing a new one if needed.
/// Resets the chapter pointer whenever a new story is installed.
#[instrument(level = "info", skip_all, fields(chapter = session.story_chapter))]
pub async fn ensure_story(
  model: Option<&ModelClient>,
  prompts: &Prompts,
  session: &mut GameSession,
) -> Story {
  if let Some(raw) = &session.story {
    if let Some(story) = decode(raw) {
      if session.story_chapter < story.chapters.len() {
        return story;
      }
      info!(target: "challenge", title = %story.title, "Story exhausted; generating a new one");
    }
  }

  let story = generate_story(model, prompts).await;
  session.story = serde_json::to_string(&story).ok();
  session.story_chapter = 0;
  story
}

async fn generate_story(model: Option<&ModelClient>, prompts: &Prompts) -> Story {
  if let Some(m) = model {
    match m.complete_json(&prompts.story_system, &prompts.story_user, 0.9).await {
      Ok(raw) => match serde_json::from_str::<Story>(&strip_code_fences(&raw)) {
        Ok(story) if !story.chapters.is_empty() => {
          info!(target: "challenge", title = %story.title, chapters = story.chapters.len(), "Story generated");
          return story;
        }
        Ok(_) => {
          error!(target: "challenge", "Generated story had no chapters; using fallback story");
        }
        Err(e) => {
          error!(target: "challenge", error = %e, "Story JSON failed to decode; using fallback story");
        }
      },
      Err(e) => {
        error!(target: "challenge", error = %e, "Story generation failed; using fallback story");
      }
    }
  }
  fallback_story()
}

//! Challenge generation: the orchestrator that decides what kind of
//! challenge comes next, drives the model failover runner, parses the
//! delimited reply, and degrades to static content when the backend is out.
//!
//! Selection precedence:
//!   1. story mode always serves the current story chapter;
//!   2. an earned thematic word takes the next slot in any other mode;
//!   3. otherwise the game mode picks riddle / image / translation.
//!
//! Only two conditions surface as errors: an empty riddle bank and an empty
//! image directory. Everything else falls back silently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Challenge, ChallengeKind, ChallengeSource, GameMode};
use crate::error::GameError;
use crate::game::GameSession;
use crate::model::{ImageAttachment, ModelClient};
use crate::parse::split_fields;
use crate::riddles::RiddleBank;
use crate::seeds::{
  fallback_story_challenge, fallback_translation_challenge, FALLBACK_IMAGE_CAPTION,
};
use crate::story::ensure_story;
use crate::util::{difficulty_word, fill_template};

/// Fixed announcement strings for the riddle call-and-response.
pub const SAKWE_ANNOUNCEMENT: &str = "Sakwe sakwe!";
pub const SAKWE_CONTEXT: &str = "Reply with 'soma' to get the riddle.";
/// The announcement is not a stored challenge; it is addressed by this id.
pub const GUSAKUZA_INIT_ID: &str = "gusakuza_init";

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// What the selection policy decided to produce next.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Selection {
  Story,
  Themed(String),
  Riddle,
  Image,
  Proverb,
  Phrase,
}

pub struct ChallengeGenerator {
  model: Option<ModelClient>,
  prompts: Prompts,
  riddles: Arc<RiddleBank>,
  image_dir: PathBuf,
}

impl ChallengeGenerator {
  pub fn new(
    model: Option<ModelClient>,
    prompts: Prompts,
    riddles: Arc<RiddleBank>,
    image_dir: PathBuf,
  ) -> Self {
    Self { model, prompts, riddles, image_dir }
  }

  /// Produce the next challenge for this session, mutating it as the
  /// selection demands (thematic pop, story advance, pending riddle).
  #[instrument(level = "info", skip_all, fields(mode = session.game_mode.as_str(), difficulty = session.difficulty))]
  pub async fn generate(
    &self,
    session: &mut GameSession,
    rng: &mut (impl Rng + ?Sized),
  ) -> Result<Challenge, GameError> {
    let selection = select(session, rng);
    info!(target: "challenge", ?selection, "Challenge selection");
    match selection {
      Selection::Riddle => self.riddle_announcement(session, rng),
      Selection::Story => Ok(self.story_challenge(session, rng).await),
      Selection::Themed(word) => Ok(self.themed_challenge(session, &word, rng).await),
      Selection::Image => self.image_challenge(session, rng).await,
      Selection::Proverb => Ok(self.translation_challenge(session, ChallengeKind::KinToEngProverb, rng).await),
      Selection::Phrase => Ok(self.translation_challenge(session, ChallengeKind::EngToKinPhrase, rng).await),
    }
  }

  /// The `soma` step: consume the parked riddle pair and turn it into a
  /// playable challenge. Consuming clears the slot, so a second `soma`
  /// without a new announcement is a precondition error.
  pub fn reveal_riddle(session: &mut GameSession) -> Result<Challenge, GameError> {
    let pending = session.pending_riddle.take().ok_or(GameError::NoPendingRiddle)?;
    let (riddle, answer) = pending.split_once('|').ok_or(GameError::PendingRiddleCorrupt)?;
    Ok(Challenge {
      id: Uuid::new_v4().to_string(),
      kind: ChallengeKind::Gusakuza,
      source: ChallengeSource::RiddleBank,
      source_text: riddle.trim().to_string(),
      target_text: answer.trim().to_string(),
      context: Some("Igisakuzo".into()),
      difficulty: session.difficulty,
    })
  }

  // --- Per-selection producers ---

  /// Riddle rounds never touch the model; the bank is the source of truth.
  fn riddle_announcement(
    &self,
    session: &mut GameSession,
    rng: &mut (impl Rng + ?Sized),
  ) -> Result<Challenge, GameError> {
    let riddle = self
      .riddles
      .draw(rng)
      .ok_or_else(|| GameError::ResourceUnavailable("Riddle bank is empty.".into()))?;
    let target_text = format!("{}|{}", riddle.riddle, riddle.answer);
    session.pending_riddle = Some(target_text.clone());
    Ok(Challenge {
      id: GUSAKUZA_INIT_ID.into(),
      kind: ChallengeKind::GusakuzaInit,
      source: ChallengeSource::RiddleBank,
      source_text: SAKWE_ANNOUNCEMENT.into(),
      target_text,
      context: Some(SAKWE_CONTEXT.into()),
      difficulty: session.difficulty,
    })
  }

  async fn story_challenge(
    &self,
    session: &mut GameSession,
    rng: &mut (impl Rng + ?Sized),
  ) -> Challenge {
    let story = ensure_story(self.model.as_ref(), &self.prompts, session).await;
    let chapter = story.chapters[session.story_chapter].clone();
    let context = format!("Chapter {}: {}", session.story_chapter + 1, chapter);
    // The chapter is consumed whether or not the model cooperates below.
    session.story_chapter += 1;

    let prompt = fill_template(&self.prompts.story_challenge_user_template, &[("chapter", chapter.as_str())])
      + &self.weak_points_suffix(session);
    match self.generate_delimited(&prompt).await {
      Ok(fields) => Challenge {
        id: Uuid::new_v4().to_string(),
        kind: ChallengeKind::StoryTranslation,
        source: ChallengeSource::Generated,
        source_text: fields[0].clone(),
        target_text: fields[1].clone(),
        context: Some(context),
        difficulty: session.difficulty,
      },
      Err(e) => {
        error!(target: "challenge", error = %e, "Story challenge generation failed; using static fallback");
        self.static_fallback(session, rng)
      }
    }
  }

  async fn themed_challenge(
    &self,
    session: &mut GameSession,
    word: &str,
    rng: &mut (impl Rng + ?Sized),
  ) -> Challenge {
    let mut prompt = fill_template(&self.prompts.themed_user_template, &[("word", word)]);
    if let Some(chapter) = peek_chapter(session) {
      prompt.push_str(&format!("\nIf natural, ground the phrase in this ongoing story: {chapter}"));
    }
    prompt.push_str(&self.weak_points_suffix(session));

    match self.generate_delimited(&prompt).await {
      Ok(fields) => Challenge {
        id: Uuid::new_v4().to_string(),
        kind: ChallengeKind::ThemedTranslation,
        source: ChallengeSource::Generated,
        source_text: fields[0].clone(),
        target_text: fields[1].clone(),
        context: Some(format!("Uses the word '{word}' you just earned.")),
        difficulty: session.difficulty,
      },
      Err(e) => {
        error!(target: "challenge", %word, error = %e, "Themed challenge generation failed; using static fallback");
        self.static_fallback(session, rng)
      }
    }
  }

  async fn translation_challenge(
    &self,
    session: &mut GameSession,
    kind: ChallengeKind,
    rng: &mut (impl Rng + ?Sized),
  ) -> Challenge {
    let level = difficulty_word(session.difficulty);
    let template = match kind {
      ChallengeKind::KinToEngProverb => &self.prompts.proverb_user_template,
      _ => &self.prompts.phrase_user_template,
    };
    let prompt = fill_template(template, &[("level", level)]) + &self.weak_points_suffix(session);

    match self.generate_delimited(&prompt).await {
      Ok(fields) => Challenge {
        id: Uuid::new_v4().to_string(),
        kind,
        source: ChallengeSource::Generated,
        source_text: fields[0].clone(),
        target_text: fields[1].clone(),
        // Proverbs may carry a cultural note as a third field.
        context: fields.get(2).cloned(),
        difficulty: session.difficulty,
      },
      Err(e) => {
        error!(target: "challenge", error = %e, "Translation challenge generation failed; using static fallback");
        self.static_fallback(session, rng)
      }
    }
  }

  async fn image_challenge(
    &self,
    session: &mut GameSession,
    rng: &mut (impl Rng + ?Sized),
  ) -> Result<Challenge, GameError> {
    let images = list_images(&self.image_dir);
    let file = images.choose(rng).ok_or_else(|| {
      GameError::ResourceUnavailable(format!(
        "No images found in the {} directory.",
        self.image_dir.display()
      ))
    })?;
    let source_text = public_image_path(&self.image_dir, file);
    let context = "Describe the image in either Kinyarwanda or English.".to_string();

    match self.describe(session, file).await {
      Ok(fields) => Ok(Challenge {
        id: Uuid::new_v4().to_string(),
        kind: ChallengeKind::ImageDescription,
        source: ChallengeSource::Generated,
        source_text,
        target_text: format!("Kinyarwanda: {} | English: {}", fields[0], fields[1]),
        context: Some(context),
        difficulty: session.difficulty,
      }),
      Err(e) => {
        error!(target: "challenge", image = %file.display(), error = %e, "Image description failed; using static caption");
        Ok(Challenge {
          id: Uuid::new_v4().to_string(),
          kind: ChallengeKind::ImageDescription,
          source: ChallengeSource::StaticFallback,
          source_text,
          target_text: FALLBACK_IMAGE_CAPTION.into(),
          context: Some(context),
          difficulty: session.difficulty,
        })
      }
    }
  }

  async fn describe(&self, session: &GameSession, file: &Path) -> Result<Vec<String>, String> {
    let model = self.model.as_ref().ok_or("model backend disabled")?;
    let bytes = tokio::fs::read(file).await.map_err(|e| e.to_string())?;
    let mime = mime_for(file);
    let mut prompt = self.prompts.image_describe_user.clone();
    if let Some(chapter) = peek_chapter(session) {
      prompt.push_str(&format!("\nIf natural, echo the setting of this ongoing story: {chapter}"));
    }
    let raw = model
      .describe_image(&self.prompts.challenge_system, &prompt, ImageAttachment { bytes, mime })
      .await?;
    split_fields(&raw).map_err(|e| e.to_string())
  }

  // --- Shared plumbing ---

  /// One model round-trip through the failover runner plus the wire parser.
  async fn generate_delimited(&self, user_prompt: &str) -> Result<Vec<String>, String> {
    let model = self.model.as_ref().ok_or("model backend disabled")?;
    let raw = model.complete(&self.prompts.challenge_system, user_prompt, 0.8).await?;
    split_fields(&raw).map_err(|e| e.to_string())
  }

  fn weak_points_suffix(&self, session: &GameSession) -> String {
    if session.incorrect_answers.is_empty() {
      return String::new();
    }
    fill_template(
      &self.prompts.weak_points_suffix_template,
      &[("answers", session.incorrect_answers.join("; ").as_str())],
    )
  }

  /// Hardcoded, model-free challenge for the active game mode. Riddle and
  /// image modes reuse their resource-backed paths, which are already
  /// model-free apart from the caption.
  fn static_fallback(&self, session: &mut GameSession, rng: &mut (impl Rng + ?Sized)) -> Challenge {
    match session.game_mode {
      GameMode::Story => fallback_story_challenge(session.difficulty),
      GameMode::Sakwe => match self.riddle_announcement(session, rng) {
        Ok(c) => c,
        Err(_) => fallback_translation_challenge(session.difficulty, rng),
      },
      GameMode::Image => {
        let images = list_images(&self.image_dir);
        match images.choose(rng) {
          Some(file) => Challenge {
            id: Uuid::new_v4().to_string(),
            kind: ChallengeKind::ImageDescription,
            source: ChallengeSource::StaticFallback,
            source_text: public_image_path(&self.image_dir, file),
            target_text: FALLBACK_IMAGE_CAPTION.into(),
            context: Some("Describe the image in either Kinyarwanda or English.".into()),
            difficulty: session.difficulty,
          },
          None => fallback_translation_challenge(session.difficulty, rng),
        }
      }
      GameMode::Translation => fallback_translation_challenge(session.difficulty, rng),
    }
  }
}

/// The selection policy. Mutates the session only by popping a thematic word.
fn select(session: &mut GameSession, rng: &mut (impl Rng + ?Sized)) -> Selection {
  if session.game_mode == GameMode::Story {
    return Selection::Story;
  }
  if let Some(word) = session.thematic_words.pop_front() {
    return Selection::Themed(word);
  }
  match session.game_mode {
    GameMode::Sakwe => Selection::Riddle,
    GameMode::Image => Selection::Image,
    _ => {
      if rng.gen_bool(0.5) {
        Selection::Proverb
      } else {
        Selection::Phrase
      }
    }
  }
}

/// Current chapter text without regenerating anything; None when the session
/// has no live story.
fn peek_chapter(session: &GameSession) -> Option<String> {
  let raw = session.story.as_deref()?;
  let story: crate::domain::Story = serde_json::from_str(raw).ok()?;
  story.chapters.get(session.story_chapter).cloned()
}

fn list_images(dir: &Path) -> Vec<PathBuf> {
  let Ok(entries) = std::fs::read_dir(dir) else { return vec![] };
  let mut files: Vec<PathBuf> = entries
    .flatten()
    .map(|e| e.path())
    .filter(|p| {
      p.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
    })
    .collect();
  // Stable order so a seeded RNG picks reproducibly.
  files.sort();
  files
}

fn public_image_path(dir: &Path, file: &Path) -> String {
  let dir_label = dir.file_name().and_then(|s| s.to_str()).unwrap_or("images");
  let file_name = file.file_name().and_then(|s| s.to_str()).unwrap_or("image");
  format!("/{}/{}", dir_label, file_name)
}

fn mime_for(file: &Path) -> String {
  match file.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
    Some("png") => "image/png".into(),
    _ => "image/jpeg".into(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::riddles::Riddle;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::collections::VecDeque;

  fn bank() -> Arc<RiddleBank> {
    Arc::new(RiddleBank::from_riddles(vec![
      Riddle { riddle: "Inshyushyu y'umusambi".into(), answer: "amazi".into() },
      Riddle { riddle: "Abakobwa banjye bangana bose".into(), answer: "inkuyo".into() },
    ]))
  }

  fn offline_generator(riddles: Arc<RiddleBank>, image_dir: PathBuf) -> ChallengeGenerator {
    ChallengeGenerator::new(None, crate::config::Prompts::default(), riddles, image_dir)
  }

  fn session(mode: GameMode) -> GameSession {
    GameSession { game_mode: mode, ..Default::default() }
  }

  fn temp_image_dir(name: &str, files: &[&str]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sakwe-test-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for f in files {
      std::fs::write(dir.join(f), b"not-a-real-image").unwrap();
    }
    dir
  }

  #[tokio::test]
  async fn sakwe_mode_announces_and_parks_the_riddle() {
    let g = offline_generator(bank(), PathBuf::from("sampleimg"));
    let mut s = session(GameMode::Sakwe);
    let mut rng = StdRng::seed_from_u64(5);
    let c = g.generate(&mut s, &mut rng).await.unwrap();
    assert_eq!(c.kind, ChallengeKind::GusakuzaInit);
    assert_eq!(c.id, GUSAKUZA_INIT_ID);
    assert_eq!(c.source_text, SAKWE_ANNOUNCEMENT);
    assert!(c.target_text.contains('|'));
    assert_eq!(s.pending_riddle.as_deref(), Some(c.target_text.as_str()));
  }

  #[tokio::test]
  async fn empty_riddle_bank_is_a_resource_error() {
    let g = offline_generator(Arc::new(RiddleBank::from_riddles(vec![])), PathBuf::from("sampleimg"));
    let mut s = session(GameMode::Sakwe);
    let mut rng = StdRng::seed_from_u64(5);
    match g.generate(&mut s, &mut rng).await {
      Err(GameError::ResourceUnavailable(_)) => {}
      other => panic!("expected ResourceUnavailable, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn reveal_consumes_the_pending_riddle_exactly_once() {
    let mut s = GameSession { pending_riddle: Some("R|A".into()), ..Default::default() };
    let c = ChallengeGenerator::reveal_riddle(&mut s).unwrap();
    assert_eq!(c.kind, ChallengeKind::Gusakuza);
    assert_eq!(c.source_text, "R");
    assert_eq!(c.target_text, "A");
    assert!(s.pending_riddle.is_none());
    match ChallengeGenerator::reveal_riddle(&mut s) {
      Err(GameError::NoPendingRiddle) => {}
      other => panic!("expected NoPendingRiddle, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn soma_before_any_sakwe_is_a_precondition_error() {
    let mut s = GameSession::default();
    assert!(matches!(ChallengeGenerator::reveal_riddle(&mut s), Err(GameError::NoPendingRiddle)));
  }

  #[tokio::test]
  async fn offline_translation_serves_the_static_fallback_deterministically() {
    let g = offline_generator(bank(), PathBuf::from("sampleimg"));
    let mut rng_a = StdRng::seed_from_u64(11);
    let mut rng_b = StdRng::seed_from_u64(11);
    let mut sa = session(GameMode::Translation);
    let mut sb = session(GameMode::Translation);
    let a = g.generate(&mut sa, &mut rng_a).await.unwrap();
    let b = g.generate(&mut sb, &mut rng_b).await.unwrap();
    assert_eq!(a.source, ChallengeSource::StaticFallback);
    assert_eq!(a.kind, b.kind);
    assert_eq!(a.source_text, b.source_text);
    assert_eq!(a.target_text, b.target_text);
  }

  #[tokio::test]
  async fn thematic_word_takes_priority_and_is_consumed() {
    let g = offline_generator(bank(), PathBuf::from("sampleimg"));
    let mut s = session(GameMode::Translation);
    s.thematic_words = VecDeque::from(["amazi".to_string()]);
    let mut rng = StdRng::seed_from_u64(2);
    // Offline, the themed path degrades to the mode's static fallback, but
    // the queue is drained either way.
    let c = g.generate(&mut s, &mut rng).await.unwrap();
    assert!(s.thematic_words.is_empty());
    assert!(matches!(c.kind, ChallengeKind::KinToEngProverb | ChallengeKind::EngToKinPhrase));
    assert_eq!(c.source, ChallengeSource::StaticFallback);
  }

  #[tokio::test]
  async fn story_mode_wins_over_the_thematic_queue() {
    let g = offline_generator(bank(), PathBuf::from("sampleimg"));
    let mut s = session(GameMode::Story);
    s.thematic_words = VecDeque::from(["amazi".to_string()]);
    let mut rng = StdRng::seed_from_u64(2);
    let c = g.generate(&mut s, &mut rng).await.unwrap();
    assert_eq!(c.kind, ChallengeKind::StoryTranslation);
    assert_eq!(s.thematic_words.len(), 1);
  }

  #[tokio::test]
  async fn story_mode_advances_the_chapter_pointer() {
    let g = offline_generator(bank(), PathBuf::from("sampleimg"));
    let mut s = session(GameMode::Story);
    let mut rng = StdRng::seed_from_u64(2);
    g.generate(&mut s, &mut rng).await.unwrap();
    assert!(s.story.is_some());
    assert_eq!(s.story_chapter, 1);
    g.generate(&mut s, &mut rng).await.unwrap();
    assert_eq!(s.story_chapter, 2);
  }

  #[tokio::test]
  async fn image_mode_serves_a_sample_image_offline() {
    let dir = temp_image_dir("img", &["hill.png", "lake.jpg", "notes.txt"]);
    let g = offline_generator(bank(), dir.clone());
    let mut s = session(GameMode::Image);
    let mut rng = StdRng::seed_from_u64(4);
    let c = g.generate(&mut s, &mut rng).await.unwrap();
    assert_eq!(c.kind, ChallengeKind::ImageDescription);
    assert_eq!(c.target_text, FALLBACK_IMAGE_CAPTION);
    assert!(c.source_text.ends_with(".png") || c.source_text.ends_with(".jpg"));
    assert!(!c.source_text.ends_with(".txt"));
    std::fs::remove_dir_all(dir).ok();
  }

  #[tokio::test]
  async fn empty_image_directory_is_a_resource_error() {
    let dir = temp_image_dir("empty", &[]);
    let g = offline_generator(bank(), dir.clone());
    let mut s = session(GameMode::Image);
    let mut rng = StdRng::seed_from_u64(4);
    match g.generate(&mut s, &mut rng).await {
      Err(GameError::ResourceUnavailable(_)) => {}
      other => panic!("expected ResourceUnavailable, got {other:?}"),
    }
    std::fs::remove_dir_all(dir).ok();
  }

  #[tokio::test]
  async fn every_mode_and_difficulty_yields_a_challenge_or_typed_error() {
    let dir = temp_image_dir("grid", &["hill.png"]);
    let g = offline_generator(bank(), dir.clone());
    for mode in GameMode::ALL {
      for difficulty in 1..=3u8 {
        let mut s = GameSession { game_mode: mode, difficulty, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(99);
        let c = g.generate(&mut s, &mut rng).await.unwrap();
        assert!(!c.source_text.is_empty());
        assert!(!c.target_text.is_empty());
        assert_eq!(c.difficulty, difficulty);
      }
    }
    std::fs::remove_dir_all(dir).ok();
  }
}

//! Built-in deterministic content: the static fallbacks used when the
//! generative backend is unavailable, plus the fallback story.
//!
//! These must always succeed. Riddle and image rounds have no seeded content
//! here on purpose: an empty riddle bank or image directory is a reportable
//! condition, not something to paper over with fabricated culture.

use rand::Rng;
use uuid::Uuid;

use crate::domain::{Challenge, ChallengeKind, ChallengeSource, Story};

/// Static translation challenges, served round-robin-randomly when the model
/// path is down in translation mode.
pub fn fallback_translation_challenge(difficulty: u8, rng: &mut (impl Rng + ?Sized)) -> Challenge {
  let pick = rng.gen_range(0..2);
  let (kind, source_text, target_text, context) = if pick == 0 {
    (
      ChallengeKind::KinToEngProverb,
      "Akabando k'iminsi gacibwa kare",
      "A walking stick for old age is prepared in advance",
      "Translate this Kinyarwanda proverb to English.",
    )
  } else {
    (
      ChallengeKind::EngToKinPhrase,
      "Good morning",
      "Mwaramutse",
      "Translate this English phrase to Kinyarwanda.",
    )
  };
  Challenge {
    id: Uuid::new_v4().to_string(),
    kind,
    source: ChallengeSource::StaticFallback,
    source_text: source_text.into(),
    target_text: target_text.into(),
    context: Some(context.into()),
    difficulty,
  }
}

const FALLBACK_CHAPTER: &str = "The morning air was crisp and cool in the village of Nyarugenge. \
Children's laughter echoed as they chased a rolling hoop down the dirt path. In the distance, \
the lush green hills of Kigali were waking up, ready for a new day.";

pub fn fallback_story_challenge(difficulty: u8) -> Challenge {
  Challenge {
    id: Uuid::new_v4().to_string(),
    kind: ChallengeKind::StoryTranslation,
    source: ChallengeSource::StaticFallback,
    source_text: "Children's laughter echoed.".into(),
    target_text: "Ibitwenge by'abana byumvikanye.".into(),
    context: Some(FALLBACK_CHAPTER.into()),
    difficulty,
  }
}

/// Ground truth shown after an image round when the model could not produce a
/// bilingual caption. Image answers are open-ended, so this is display-only.
pub const FALLBACK_IMAGE_CAPTION: &str = "A beautiful Rwandan landscape.";

/// Three-chapter narrative used when story generation fails outright.
pub fn fallback_story() -> Story {
  Story {
    title: "Urugendo rwa Keza".into(),
    chapters: vec![
      "Keza left her village at dawn, carrying a basket of sweet potatoes for the market in Kigali. \
The road wound through banana groves, and she greeted every neighbor with a warm 'Mwaramutse'."
        .into(),
      "At the market, Keza traded her sweet potatoes for a bright kitenge cloth. A storyteller nearby \
was asking children riddles, and the square rang with shouts of 'Sakwe sakwe!'"
        .into(),
      "On the way home, rain washed the hills green. Keza sheltered under a fig tree and decided that \
tomorrow she would learn one new word for everything she had seen."
        .into(),
    ],
  }
}

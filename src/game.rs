//! Game session state and the submit-answer transition rules.
//!
//! Sessions are owned by the calling layer: each request fetches one, the
//! core mutates it, the caller writes it back. Nothing here touches the
//! network or the stores.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, ChallengeKind, GameMode};

/// Points granted per correct answer.
pub const SCORE_AWARD: u32 = 10;
/// A mode/difficulty milestone fires every time the score crosses a
/// multiple of this.
pub const MILESTONE_STEP: u32 = 50;
pub const MAX_LIVES: u8 = 3;
pub const MAX_DIFFICULTY: u8 = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
  pub lives: u8,
  pub score: u32,
  pub difficulty: u8,
  pub game_mode: GameMode,
  /// `"riddle|answer"` pair parked between the sakwe announcement and the
  /// soma reveal. Cleared once consumed.
  #[serde(default)]
  pub pending_riddle: Option<String>,
  /// FIFO of words to weave into upcoming challenges, earned by solving
  /// riddles.
  #[serde(default)]
  pub thematic_words: VecDeque<String>,
  /// JSON-encoded `Story`, opaque at this layer.
  #[serde(default)]
  pub story: Option<String>,
  #[serde(default)]
  pub story_chapter: usize,
  /// Wrong answers since the last correct one; biases future prompts.
  #[serde(default)]
  pub incorrect_answers: Vec<String>,
}

impl Default for GameSession {
  fn default() -> Self {
    Self {
      lives: MAX_LIVES,
      score: 0,
      difficulty: 1,
      game_mode: GameMode::default(),
      pending_riddle: None,
      thematic_words: VecDeque::new(),
      story: None,
      story_chapter: 0,
      incorrect_answers: Vec::new(),
    }
  }
}

/// A milestone crossed by a correct answer: new mode, raised difficulty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Milestone {
  pub new_mode: GameMode,
  pub difficulty: u8,
}

/// What a submit-answer transition did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
  Correct { score_awarded: u32, milestone: Option<Milestone> },
  Incorrect { lives_left: u8 },
  /// Lives ran out; the session has already been reset in place.
  GameOver,
}

impl GameSession {
  /// Apply one evaluated answer to the session. The challenge is the one the
  /// answer was submitted against (riddle answers feed the thematic queue).
  pub fn apply_answer(
    &mut self,
    user_answer: &str,
    is_correct: bool,
    challenge: &Challenge,
    rng: &mut (impl Rng + ?Sized),
  ) -> AnswerOutcome {
    if is_correct {
      self.score += SCORE_AWARD;
      self.incorrect_answers.clear();
      if challenge.kind == ChallengeKind::Gusakuza {
        self.thematic_words.push_back(challenge.target_text.clone());
      }
      let milestone = (self.score % MILESTONE_STEP == 0).then(|| self.advance_milestone(rng));
      AnswerOutcome::Correct { score_awarded: SCORE_AWARD, milestone }
    } else {
      self.lives = self.lives.saturating_sub(1);
      self.incorrect_answers.push(user_answer.to_string());
      if self.lives == 0 {
        self.reset_after_game_over();
        AnswerOutcome::GameOver
      } else {
        AnswerOutcome::Incorrect { lives_left: self.lives }
      }
    }
  }

  /// Pick a new game mode different from the current one and raise the
  /// difficulty, capped.
  fn advance_milestone(&mut self, rng: &mut (impl Rng + ?Sized)) -> Milestone {
    let choices: Vec<GameMode> =
      GameMode::ALL.iter().copied().filter(|m| *m != self.game_mode).collect();
    // ALL has four entries so there is always something to switch to.
    self.game_mode = *choices.choose(rng).expect("mode choices");
    self.difficulty = (self.difficulty + 1).min(MAX_DIFFICULTY);
    Milestone { new_mode: self.game_mode, difficulty: self.difficulty }
  }

  fn reset_after_game_over(&mut self) {
    self.lives = MAX_LIVES;
    self.score = 0;
    self.incorrect_answers.clear();
    self.thematic_words.clear();
  }
}

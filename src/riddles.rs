//! The riddle bank: ibisakuzo loaded once at startup from a JSON file.
//!
//! File format: `[{"riddle": "...", "answer": "..."}, ...]`. A missing or
//! malformed file degrades to an empty bank (logged, never fatal); the
//! generator reports an empty bank as a resource-unavailable condition.

use std::path::Path;
use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Riddle {
  pub riddle: String,
  pub answer: String,
}

pub struct RiddleBank {
  riddles: Vec<Riddle>,
  // Index of the last riddle served, so consecutive draws differ when the
  // bank has more than one entry.
  last_served: Mutex<Option<usize>>,
}

impl RiddleBank {
  pub fn from_riddles(riddles: Vec<Riddle>) -> Self {
    Self { riddles, last_served: Mutex::new(None) }
  }

  /// Load the bank from a JSON file. Any IO or decode problem yields an
  /// empty bank.
  pub fn load(path: &Path) -> Self {
    let riddles = match std::fs::read_to_string(path) {
      Ok(raw) => match serde_json::from_str::<Vec<Riddle>>(&raw) {
        Ok(riddles) => riddles,
        Err(e) => {
          warn!(target: "sakwe_backend", path = %path.display(), error = %e, "Could not decode riddle bank; riddles disabled");
          vec![]
        }
      },
      Err(e) => {
        warn!(target: "sakwe_backend", path = %path.display(), error = %e, "Could not read riddle bank; riddles disabled");
        vec![]
      }
    };
    info!(target: "sakwe_backend", path = %path.display(), count = riddles.len(), "Riddle bank loaded");
    Self::from_riddles(riddles)
  }

  pub fn is_empty(&self) -> bool {
    self.riddles.is_empty()
  }

  pub fn len(&self) -> usize {
    self.riddles.len()
  }

  /// Random draw that avoids repeating the previously served riddle.
  pub fn draw(&self, rng: &mut (impl Rng + ?Sized)) -> Option<Riddle> {
    if self.riddles.is_empty() {
      return None;
    }
    let mut last = self.last_served.lock().expect("riddle bank lock poisoned");
    let idx = if self.riddles.len() == 1 {
      0
    } else {
      let candidates: Vec<usize> = (0..self.riddles.len()).filter(|i| Some(*i) != *last).collect();
      *candidates.choose(rng).unwrap_or(&0)
    };
    *last = Some(idx);
    Some(self.riddles[idx].clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn bank(n: usize) -> RiddleBank {
    RiddleBank::from_riddles(
      (0..n)
        .map(|i| Riddle { riddle: format!("riddle-{i}"), answer: format!("answer-{i}") })
        .collect(),
    )
  }

  #[test]
  fn empty_bank_draws_nothing() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(bank(0).draw(&mut rng).is_none());
    assert!(bank(0).is_empty());
  }

  #[test]
  fn single_entry_repeats() {
    let b = bank(1);
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(b.draw(&mut rng), b.draw(&mut rng));
  }

  #[test]
  fn consecutive_draws_never_repeat_with_two_or_more() {
    let b = bank(3);
    let mut rng = StdRng::seed_from_u64(42);
    let mut prev = b.draw(&mut rng).unwrap();
    for _ in 0..50 {
      let next = b.draw(&mut rng).unwrap();
      assert_ne!(prev, next);
      prev = next;
    }
  }

  #[test]
  fn missing_file_degrades_to_empty() {
    let b = RiddleBank::load(Path::new("/nonexistent/riddles.json"));
    assert!(b.is_empty());
  }
}

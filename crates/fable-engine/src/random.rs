//! Injectable randomness for depth smoothing and template picks.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Draw one number in `[0, 1)`.
    fn roll(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn roll(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Seeded RNG, or one seeded from the OS when no seed is given.
pub fn session_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Replays a fixed list of draws, then returns `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    rolls: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRolls {
    /// Script the given draws; once exhausted every draw is 0.5.
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 0.5,
        }
    }

    /// Change the value returned once the script runs out.
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

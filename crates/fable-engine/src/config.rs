//! Configuration for a narrative session.

use fable_core::GameTime;

/// Configuration for a narrative session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// RNG seed for reproducible smoothing and template picks. `None` uses OS entropy.
    pub seed: Option<u64>,
    /// Count each turn's prose toward the beat word totals.
    pub count_prose_words: bool,
    /// Clock value for new games.
    pub start_time: GameTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            count_prose_words: true,
            start_time: GameTime::default(),
        }
    }
}

impl SessionConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable prose word counting.
    pub fn with_word_count(mut self, enabled: bool) -> Self {
        self.count_prose_words = enabled;
        self
    }

    /// Set the clock value for new games.
    pub fn with_start_time(mut self, start: GameTime) -> Self {
        self.start_time = start;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.seed, None);
        assert!(cfg.count_prose_words);
        assert_eq!(cfg.start_time.to_string(), "1925-12-26 00:00:00");
    }

    #[test]
    fn builder_methods() {
        let start = GameTime::parse("1926-01-01 08:00:00").unwrap();
        let cfg = SessionConfig::default()
            .with_seed(7)
            .with_word_count(false)
            .with_start_time(start);
        assert_eq!(cfg.seed, Some(7));
        assert!(!cfg.count_prose_words);
        assert_eq!(cfg.start_time, start);
    }
}

//! Synthetic-opponent configuration.

use std::time::Duration;

use rand::Rng;

// ---------------------------------------------------------------------------
// BotConfig
// ---------------------------------------------------------------------------

/// How the synthetic opponent of a bot room behaves.
///
/// The defaults match the live service: a bot called `Bot` that adds one
/// point every 7–12 seconds and leaves once it has counted to 20.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Nickname shown to the human side.
    pub nickname: String,

    /// The bot stops (and the room closes) once its count reaches this.
    pub score_ceiling: u32,

    /// Shortest pause between two bot increments.
    pub min_interval: Duration,

    /// Longest pause between two bot increments.
    pub max_interval: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nickname: "Bot".to_string(),
            score_ceiling: 20,
            min_interval: Duration::from_secs(7),
            max_interval: Duration::from_secs(12),
        }
    }
}

impl BotConfig {
    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called by the registry when it is created. Rules:
    /// - `score_ceiling` is at least 1.
    /// - `max_interval` is raised to `min_interval` if it was below it.
    pub fn validated(mut self) -> Self {
        if self.score_ceiling == 0 {
            tracing::warn!("bot score_ceiling of 0 raised to 1");
            self.score_ceiling = 1;
        }
        if self.max_interval < self.min_interval {
            tracing::warn!(
                min = ?self.min_interval,
                max = ?self.max_interval,
                "bot max_interval below min_interval, raising it"
            );
            self.max_interval = self.min_interval;
        }
        self
    }

    /// Draws the next pause, uniformly from `min_interval..=max_interval`
    /// at millisecond resolution.
    pub fn sample_interval(&self) -> Duration {
        let min = self.min_interval.as_millis() as u64;
        let max = self.max_interval.as_millis() as u64;
        if max <= min {
            return self.min_interval;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_config_default() {
        let config = BotConfig::default();
        assert_eq!(config.nickname, "Bot");
        assert_eq!(config.score_ceiling, 20);
        assert_eq!(config.min_interval, Duration::from_secs(7));
        assert_eq!(config.max_interval, Duration::from_secs(12));
    }

    #[test]
    fn test_sample_interval_stays_in_range() {
        let config = BotConfig::default();
        for _ in 0..200 {
            let d = config.sample_interval();
            assert!(d >= Duration::from_secs(7), "{d:?} below range");
            assert!(d <= Duration::from_secs(12), "{d:?} above range");
        }
    }

    #[test]
    fn test_validated_fixes_inverted_range_and_zero_ceiling() {
        let config = BotConfig {
            score_ceiling: 0,
            min_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(1),
            ..BotConfig::default()
        }
        .validated();

        assert_eq!(config.score_ceiling, 1);
        assert_eq!(config.max_interval, Duration::from_secs(5));
        assert_eq!(config.sample_interval(), Duration::from_secs(5));
    }
}

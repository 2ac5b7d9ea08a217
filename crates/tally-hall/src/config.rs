use std::time::Duration;

/// Configuration for the waiting hall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HallConfig {
    /// How long a player waits alone before being given a synthetic
    /// opponent. Default: 8 seconds.
    pub match_wait: Duration,
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            match_wait: Duration::from_secs(8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hall_config_default() {
        assert_eq!(HallConfig::default().match_wait, Duration::from_secs(8));
    }
}

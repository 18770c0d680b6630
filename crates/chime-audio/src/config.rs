use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Initial category volumes and sequence timing for an [`AudioHelper`](crate::AudioHelper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sound effect category multiplier.
    pub sfx_volume: f64,
    /// Music category multiplier.
    pub music_volume: f64,
    /// Default gap between sequence steps, in milliseconds.
    pub sequence_delay_ms: u64,
    /// Default half-spread of the random gap offset, in milliseconds.
    pub sequence_random_offset_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sfx_volume: 0.1,
            music_volume: 1.0,
            sequence_delay_ms: 200,
            sequence_random_offset_ms: 0,
        }
    }
}

impl AudioConfig {
    /// Parse a config from TOML text. Missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, AudioError> {
        Ok(toml::from_str(text)?)
    }

    /// Sequence timing derived from this config.
    pub fn sequence_options(&self) -> SequenceOptions {
        SequenceOptions {
            delay: Duration::from_millis(self.sequence_delay_ms),
            random_offset: Duration::from_millis(self.sequence_random_offset_ms),
        }
    }
}

/// Timing for [`AudioHelper::play_sequence`](crate::AudioHelper::play_sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceOptions {
    /// Gap between consecutive keys.
    pub delay: Duration,
    /// When non-zero, each gap is drawn uniformly from `delay ± random_offset`.
    pub random_offset: Duration,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        AudioConfig::default().sequence_options()
    }
}

impl SequenceOptions {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            random_offset: Duration::ZERO,
        }
    }

    pub fn with_random_offset(mut self, random_offset: Duration) -> Self {
        self.random_offset = random_offset;
        self
    }

    /// Gap before the next step, given a uniform draw `u` in `[0, 1)`.
    pub(crate) fn gap(&self, u: f64) -> Duration {
        if self.random_offset.is_zero() {
            return self.delay;
        }
        let delay = self.delay.as_nanos() as f64;
        let offset = self.random_offset.as_nanos() as f64;
        let total = delay - offset + u * offset * 2.0;
        Duration::from_nanos(total.max(0.0).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_volumes() {
        let config = AudioConfig::default();
        assert_eq!(config.sfx_volume, 0.1);
        assert_eq!(config.music_volume, 1.0);
        assert_eq!(config.sequence_delay_ms, 200);
        assert_eq!(config.sequence_random_offset_ms, 0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AudioConfig::from_toml_str("music_volume = 0.4").unwrap();
        assert_eq!(config.music_volume, 0.4);
        assert_eq!(config.sfx_volume, 0.1);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = AudioConfig::from_toml_str("sfx_volume = \"loud\"").unwrap_err();
        assert!(matches!(err, AudioError::Config(_)));
    }

    #[test]
    fn fixed_gap_ignores_draw() {
        let options = SequenceOptions::new(Duration::from_millis(200));
        assert_eq!(options.gap(0.0), Duration::from_millis(200));
        assert_eq!(options.gap(0.99), Duration::from_millis(200));
    }

    #[test]
    fn jittered_gap_spans_offset() {
        let options = SequenceOptions::new(Duration::from_millis(200))
            .with_random_offset(Duration::from_millis(50));
        assert_eq!(options.gap(0.0), Duration::from_millis(150));
        assert_eq!(options.gap(0.5), Duration::from_millis(200));
        assert!(options.gap(0.999) < Duration::from_millis(250));
    }

    #[test]
    fn negative_gap_clamps_to_zero() {
        let options = SequenceOptions::new(Duration::from_millis(10))
            .with_random_offset(Duration::from_millis(100));
        assert_eq!(options.gap(0.0), Duration::ZERO);
    }
}

//! Queue tuning: sequencer lock wait and subscriber send bound.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// How long a token request waits for its doctor's sequence
    #[serde(default = "default_sequencer_acquire_timeout")]
    pub sequencer_acquire_timeout_ms: u64,

    /// How long one subscriber may take to accept one event
    #[serde(default = "default_broadcast_send_timeout")]
    pub broadcast_send_timeout_ms: u64,
}

impl QueueConfig {
    pub fn sequencer_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.sequencer_acquire_timeout_ms)
    }

    pub fn broadcast_send_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_send_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_TIMEOUT_MS).contains(&self.sequencer_acquire_timeout_ms) {
            return Err(ValidationError::InvalidQueueTimeout(
                "sequencer_acquire_timeout_ms",
            ));
        }
        if !(1..=MAX_TIMEOUT_MS).contains(&self.broadcast_send_timeout_ms) {
            return Err(ValidationError::InvalidQueueTimeout(
                "broadcast_send_timeout_ms",
            ));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            sequencer_acquire_timeout_ms: default_sequencer_acquire_timeout(),
            broadcast_send_timeout_ms: default_broadcast_send_timeout(),
        }
    }
}

fn default_sequencer_acquire_timeout() -> u64 {
    2000
}

fn default_broadcast_send_timeout() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.sequencer_acquire_timeout(), Duration::from_secs(2));
        assert_eq!(config.broadcast_send_timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let config = QueueConfig {
            sequencer_acquire_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidQueueTimeout("sequencer_acquire_timeout_ms"))
        );

        let config = QueueConfig {
            broadcast_send_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidQueueTimeout("broadcast_send_timeout_ms"))
        );
    }
}

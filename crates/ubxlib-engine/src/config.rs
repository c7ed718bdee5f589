use std::time::Duration;

use ubxlib_frame::ParserConfig;

use crate::error::{EngineError, Result};

/// Upper bound for [`EngineConfig::max_retries`].
pub const MAX_RETRIES: u32 = 10;

/// Upper bound for [`EngineConfig::retry_delay`].
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Longest pause of the receive thread between failed reads.
pub const MAX_RECEIVE_BACKOFF: Duration = Duration::from_millis(500);

/// Retry policy and plumbing for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retransmissions after the first attempt.
    pub max_retries: u32,

    /// How long each attempt waits for its reply.
    pub retry_delay: Duration,

    /// Pause of the receive thread after a failed read, doubled for each
    /// consecutive failure up to [`MAX_RECEIVE_BACKOFF`].
    pub receive_backoff: Duration,

    /// Received chunks buffered between the receive thread and the engine.
    pub channel_capacity: usize,

    pub parser: ParserConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay: Duration::from_millis(3000),
            receive_backoff: Duration::from_millis(10),
            channel_capacity: 64,
            parser: ParserConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        check_retries(self.max_retries)?;
        check_retry_delay(self.retry_delay)
    }
}

pub(crate) fn check_retries(retries: u32) -> Result<()> {
    if retries > MAX_RETRIES {
        return Err(EngineError::InvalidRetries(retries));
    }
    Ok(())
}

pub(crate) fn check_retry_delay(delay: Duration) -> Result<()> {
    if delay > MAX_RETRY_DELAY {
        return Err(EngineError::InvalidRetryDelay(delay));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().expect("default config should validate");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(3));
        assert_eq!(config.parser.max_message_length, 1000);
    }

    #[test]
    fn bounds_are_inclusive() {
        let config = EngineConfig {
            max_retries: MAX_RETRIES,
            retry_delay: MAX_RETRY_DELAY,
            ..EngineConfig::default()
        };
        config.validate().expect("limits themselves should be accepted");

        let config = EngineConfig {
            retry_delay: Duration::ZERO,
            max_retries: 0,
            ..EngineConfig::default()
        };
        config.validate().expect("zero should be accepted");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            check_retries(11),
            Err(EngineError::InvalidRetries(11))
        ));
        assert!(matches!(
            check_retry_delay(Duration::from_millis(5001)),
            Err(EngineError::InvalidRetryDelay(_))
        ));
    }
}

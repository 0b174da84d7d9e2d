//! Lock coordinator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LockError;

/// Configuration for a [`QuorumLock`](crate::QuorumLock).
///
/// Immutable for the coordinator's lifetime. Defaults follow the classic
/// Redlock tuning: up to 10 attempts, a retry delay jittered between 100ms
/// and 200ms, and a 1% clock-drift margin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Minimum delay between acquisition attempts.
    #[serde(with = "millis_serde", default = "default_retry_delay_min")]
    pub retry_delay_min: Duration,
    /// Maximum delay between acquisition attempts.
    #[serde(with = "millis_serde", default = "default_retry_delay_max")]
    pub retry_delay_max: Duration,
    /// Upper bound on acquisition attempts per `acquire` call.
    pub max_retries: u32,
    /// Fractional safety margin applied to the TTL, covering store-side
    /// expiry precision and client/server clock skew.
    pub clock_drift_factor: f64,
}

fn default_retry_delay_min() -> Duration {
    Duration::from_millis(100)
}

fn default_retry_delay_max() -> Duration {
    Duration::from_millis(200)
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retry_delay_min: default_retry_delay_min(),
            retry_delay_max: default_retry_delay_max(),
            max_retries: 10,
            clock_drift_factor: 0.01,
        }
    }
}

impl LockConfig {
    /// Create a builder.
    pub fn builder() -> LockConfigBuilder {
        LockConfigBuilder::new()
    }

    /// Check the configuration for values the protocol cannot run with.
    pub fn validate(&self) -> Result<(), LockError> {
        if self.max_retries == 0 {
            return Err(LockError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.retry_delay_min > self.retry_delay_max {
            return Err(LockError::InvalidConfig(
                "retry_delay_min must not exceed retry_delay_max".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.clock_drift_factor) {
            return Err(LockError::InvalidConfig(
                "clock_drift_factor must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for lock configuration.
#[derive(Default)]
pub struct LockConfigBuilder {
    config: LockConfig,
}

impl LockConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: LockConfig::default(),
        }
    }

    /// Set the retry delay range; attempts sleep a uniform jittered delay
    /// drawn from `[min, max]`.
    pub fn retry_delay(mut self, min: Duration, max: Duration) -> Self {
        self.config.retry_delay_min = min;
        self.config.retry_delay_max = max;
        self
    }

    /// Set the maximum number of acquisition attempts.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the clock-drift safety factor.
    pub fn clock_drift_factor(mut self, factor: f64) -> Self {
        self.config.clock_drift_factor = factor;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LockConfig {
        self.config
    }
}

mod millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

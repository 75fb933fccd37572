//! Lifecycle timing configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::state::TransitionKind;

/// Simulated deploy delays and event channel sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Delay before a `start` commits `Running`
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// Delay before a `redeploy` commits `Running`
    #[serde(default = "default_redeploy_delay_ms")]
    pub redeploy_delay_ms: u64,
    /// Capacity of the outcome broadcast channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_start_delay_ms() -> u64 {
    2000
}

fn default_redeploy_delay_ms() -> u64 {
    3500
}

fn default_event_channel_capacity() -> usize {
    256
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: default_start_delay_ms(),
            redeploy_delay_ms: default_redeploy_delay_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl LifecycleConfig {
    #[must_use]
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    #[must_use]
    pub fn redeploy_delay(&self) -> Duration {
        Duration::from_millis(self.redeploy_delay_ms)
    }

    /// Deploy delay for a transition, `None` when it completes immediately
    #[must_use]
    pub fn delay_for(&self, kind: TransitionKind) -> Option<Duration> {
        match kind {
            TransitionKind::Start => Some(self.start_delay()),
            TransitionKind::Redeploy => Some(self.redeploy_delay()),
            TransitionKind::Stop => None,
        }
    }

    /// Check delay ordering: `0 < start < redeploy`
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` describing the violated constraint
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start_delay_ms == 0 {
            return Err(CoreError::ConfigError(
                "start_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.redeploy_delay_ms <= self.start_delay_ms {
            return Err(CoreError::ConfigError(format!(
                "redeploy_delay_ms ({}) must be greater than start_delay_ms ({})",
                self.redeploy_delay_ms, self.start_delay_ms
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(CoreError::ConfigError(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Instance lifecycle state machine types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use central_api::events::OutcomeKind;

use crate::error::{CoreError, Field};

/// Lifecycle status of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceStatus {
    Stopped,
    Deploying,
    Running,
}

impl InstanceStatus {
    /// Every status, in display order
    pub const ALL: [InstanceStatus; 3] = [
        InstanceStatus::Running,
        InstanceStatus::Stopped,
        InstanceStatus::Deploying,
    ];

    /// Canonical spelling
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceStatus::Stopped => "Stopped",
            InstanceStatus::Deploying => "Deploying",
            InstanceStatus::Running => "Running",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = CoreError;

    /// Case-insensitive match against the closed status set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                CoreError::validation(
                    Field::Status,
                    format!("unknown status {s:?}, use Running, Stopped or Deploying"),
                )
            })
    }
}

/// Lifecycle operation requested on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Start,
    Stop,
    Redeploy,
}

impl TransitionKind {
    /// Status written as soon as the transition is accepted
    #[must_use]
    pub fn immediate_status(self) -> InstanceStatus {
        match self {
            TransitionKind::Start | TransitionKind::Redeploy => InstanceStatus::Deploying,
            TransitionKind::Stop => InstanceStatus::Stopped,
        }
    }

    /// Status committed once the deploy delay elapses, `None` for immediate transitions
    #[must_use]
    pub fn delayed_status(self) -> Option<InstanceStatus> {
        match self {
            TransitionKind::Start | TransitionKind::Redeploy => Some(InstanceStatus::Running),
            TransitionKind::Stop => None,
        }
    }

    /// Outcome reported when the transition completes normally
    #[must_use]
    pub fn completed_outcome(self) -> OutcomeKind {
        match self {
            TransitionKind::Start => OutcomeKind::Started,
            TransitionKind::Stop => OutcomeKind::Stopped,
            TransitionKind::Redeploy => OutcomeKind::Redeployed,
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionKind::Start => "start",
            TransitionKind::Stop => "stop",
            TransitionKind::Redeploy => "redeploy",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("running".parse::<InstanceStatus>().unwrap(), InstanceStatus::Running);
        assert_eq!("STOPPED".parse::<InstanceStatus>().unwrap(), InstanceStatus::Stopped);
        assert_eq!("DePloYing".parse::<InstanceStatus>().unwrap(), InstanceStatus::Deploying);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "paused".parse::<InstanceStatus>().unwrap_err();
        assert_eq!(err.field(), Some(Field::Status));
    }

    #[test]
    fn test_transition_targets() {
        assert_eq!(TransitionKind::Start.immediate_status(), InstanceStatus::Deploying);
        assert_eq!(TransitionKind::Redeploy.delayed_status(), Some(InstanceStatus::Running));
        assert_eq!(TransitionKind::Stop.delayed_status(), None);
    }
}

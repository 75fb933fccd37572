//! Lifecycle outcome events

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of outcome reported for a single lifecycle call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// `start` finished deploying
    Started,
    /// `start` on an instance that was already running
    AlreadyRunning,
    /// `stop` applied
    Stopped,
    /// `redeploy` finished deploying
    Redeployed,
    /// In-flight transition cancelled, instance left stopped
    Cancelled,
    /// Rejected because another transition is in flight
    Busy,
    /// Rejected up front or failed during the delayed phase
    TransitionFailed,
}

impl OutcomeKind {
    /// Whether the outcome reports a rejection or failure
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, OutcomeKind::Busy | OutcomeKind::TransitionFailed)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::Started => "started",
            OutcomeKind::AlreadyRunning => "already running",
            OutcomeKind::Stopped => "stopped",
            OutcomeKind::Redeployed => "redeployed",
            OutcomeKind::Cancelled => "cancelled",
            OutcomeKind::Busy => "busy",
            OutcomeKind::TransitionFailed => "transition failed",
        };
        f.write_str(s)
    }
}

/// Outcome of a lifecycle call, delivered to notification sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// Instance the call targeted
    pub instance_id: u64,
    /// What happened
    pub kind: OutcomeKind,
    /// Human readable message
    pub message: String,
    /// When the outcome was produced
    pub at: DateTime<Utc>,
}

impl OutcomeEvent {
    /// Create an event stamped with the current time
    pub fn new(instance_id: u64, kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            instance_id,
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_kind_serializes_snake_case() {
        let json = serde_json::to_string(&OutcomeKind::AlreadyRunning).unwrap();
        assert_eq!(json, "\"already_running\"");
    }

    #[test]
    fn test_failure_kinds() {
        assert!(OutcomeKind::Busy.is_failure());
        assert!(OutcomeKind::TransitionFailed.is_failure());
        assert!(!OutcomeKind::Started.is_failure());
        assert!(!OutcomeKind::Cancelled.is_failure());
    }
}

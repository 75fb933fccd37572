//! Instance records

use std::fmt;

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use serde::{Deserialize, Serialize};

use crate::state::InstanceStatus;

/// Stable identifier assigned by the store, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for InstanceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked server instance
///
/// Records handed out by the store are copies; changing one has no effect
/// on the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Reply)]
pub struct Instance {
    /// Store-assigned identifier
    pub id: InstanceId,
    /// Display label
    pub name: String,
    /// Current lifecycle status
    pub status: InstanceStatus,
    /// Dotted-quad IPv4 address
    pub address: String,
    /// Last time `status` changed
    pub last_status_change: DateTime<Utc>,
    /// Bumped whenever `status` changes
    pub revision: u64,
}

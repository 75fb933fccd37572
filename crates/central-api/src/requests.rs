//! Input types for creating and editing instances

use serde::{Deserialize, Serialize};

/// Raw, unvalidated instance fields as entered by a user or read from config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInput {
    /// Display name
    pub name: String,
    /// Status text (`Running`, `Stopped` or `Deploying`, any case)
    pub status: String,
    /// Dotted-quad IPv4 address
    pub address: String,
}

impl InstanceInput {
    /// Build an input from anything string-like
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            address: address.into(),
        }
    }
}

//! Core error types for central-core

use std::fmt;

use thiserror::Error;

use crate::instance::InstanceId;

/// Instance field named by a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Status,
    Address,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::Name => "name",
            Field::Status => "status",
            Field::Address => "address",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in core store and lifecycle operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input rejected before anything was written
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Offending field
        field: Field,
        /// What was wrong with it
        reason: String,
    },

    /// Instance not found in the store
    #[error("instance not found: {0}")]
    NotFound(InstanceId),

    /// Another transition is already in flight for the instance
    #[error("instance {0} is busy: a transition is already in flight")]
    Busy(InstanceId),

    /// Cancel requested but nothing is in flight
    #[error("instance {0} has no transition in flight")]
    NotInFlight(InstanceId),

    /// Record was edited or replaced while a transition was pending
    #[error("instance {0} was modified while the transition was pending")]
    StaleRevision(InstanceId),

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    /// Build a validation error for `field`
    pub fn validation(field: Field, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Field named by a validation error
    #[must_use]
    pub fn field(&self) -> Option<Field> {
        match self {
            CoreError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Instance named by the error, if any
    #[must_use]
    pub fn instance_id(&self) -> Option<InstanceId> {
        match self {
            CoreError::NotFound(id)
            | CoreError::Busy(id)
            | CoreError::NotInFlight(id)
            | CoreError::StaleRevision(id) => Some(*id),
            _ => None,
        }
    }
}

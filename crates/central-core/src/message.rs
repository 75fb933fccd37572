//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use central_api::requests::InstanceInput;

use crate::instance::InstanceId;
use crate::state::InstanceStatus;

// ============================================================================
// InstanceStore Messages
// ============================================================================

/// Validate and insert a new instance
#[derive(Debug)]
pub struct AddInstance {
    pub input: InstanceInput,
}

/// Validate and replace name, status and address of an instance
#[derive(Debug)]
pub struct UpdateInstance {
    pub id: InstanceId,
    pub input: InstanceInput,
}

/// Remove an instance
#[derive(Debug)]
pub struct DeleteInstance {
    pub id: InstanceId,
}

/// Fetch a copy of one instance
#[derive(Debug)]
pub struct GetInstance {
    pub id: InstanceId,
}

/// Snapshot of all instances in insertion order
#[derive(Debug)]
pub struct ListInstances;

/// Overwrite the status of an instance
///
/// Only the lifecycle controller sends this.
#[derive(Debug)]
pub struct SetStatus {
    pub id: InstanceId,
    pub status: InstanceStatus,
}

/// Overwrite the status only if it has not changed since `expected_revision`
///
/// Used to commit the delayed phase of a transition.
#[derive(Debug)]
pub struct CompareAndSetStatus {
    pub id: InstanceId,
    pub status: InstanceStatus,
    pub expected_revision: u64,
}

// ============================================================================
// LifecycleController Messages
// ============================================================================

/// Deploy a stopped instance
#[derive(Debug)]
pub struct Start {
    pub id: InstanceId,
}

/// Stop an instance immediately
#[derive(Debug)]
pub struct Stop {
    pub id: InstanceId,
}

/// Deploy an instance again regardless of its status
#[derive(Debug)]
pub struct Redeploy {
    pub id: InstanceId,
}

/// Abort an in-flight start or redeploy, leaving the instance stopped
#[derive(Debug)]
pub struct Cancel {
    pub id: InstanceId,
}

/// Whether a transition is in flight for an instance
#[derive(Debug)]
pub struct IsInFlight {
    pub id: InstanceId,
}

/// Deploy delay elapsed; sent by the timer task back to the controller
#[derive(Debug)]
pub struct Settle {
    pub id: InstanceId,
    pub generation: u64,
}

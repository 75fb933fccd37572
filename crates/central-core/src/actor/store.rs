//! `InstanceStore`: owner of all instance records
//!
//! The actor mailbox is the single-writer queue: every mutation runs to
//! completion before the next message is handled, and readers receive
//! cloned records so they never see a half-applied write.

use std::collections::BTreeMap;

use chrono::Utc;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tracing::{debug, info};

use central_api::requests::InstanceInput;

use crate::error::CoreError;
use crate::instance::{Instance, InstanceId};
use crate::message::{
    AddInstance, CompareAndSetStatus, DeleteInstance, GetInstance, ListInstances, SetStatus,
    UpdateInstance,
};
use crate::state::InstanceStatus;
use crate::validate::validate;

/// Keyed instance collection
///
/// Ids are handed out from a monotonically increasing counter, so key order
/// is insertion order.
#[derive(Debug)]
pub struct InstanceStore {
    records: BTreeMap<InstanceId, Instance>,
    next_id: u64,
}

impl Default for InstanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Number of stored instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate and insert a new record
    ///
    /// # Errors
    /// Returns `CoreError::Validation` and stores nothing if any field is invalid
    pub fn add(&mut self, input: &InstanceInput) -> Result<Instance, CoreError> {
        let valid = validate(input)?;
        let id = InstanceId::new(self.next_id);
        self.next_id += 1;

        let instance = Instance {
            id,
            name: valid.name,
            status: valid.status,
            address: valid.address,
            last_status_change: Utc::now(),
            revision: 1,
        };
        self.records.insert(id, instance.clone());

        info!(instance_id = %id, name = %instance.name, status = %instance.status, "instance added");
        Ok(instance)
    }

    /// Validate and replace all editable fields of a record
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` or `CoreError::Validation`; the record is
    /// untouched on error
    pub fn update(&mut self, id: InstanceId, input: &InstanceInput) -> Result<Instance, CoreError> {
        let record = self.records.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        let valid = validate(input)?;

        if record.status != valid.status {
            record.last_status_change = Utc::now();
            record.revision += 1;
        }
        record.name = valid.name;
        record.status = valid.status;
        record.address = valid.address;

        info!(instance_id = %id, name = %record.name, status = %record.status, "instance updated");
        Ok(record.clone())
    }

    /// Remove a record
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the id is unknown
    pub fn delete(&mut self, id: InstanceId) -> Result<(), CoreError> {
        let removed = self.records.remove(&id).ok_or(CoreError::NotFound(id))?;
        info!(instance_id = %id, name = %removed.name, "instance deleted");
        Ok(())
    }

    /// Copy of a record
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the id is unknown
    pub fn get(&self, id: InstanceId) -> Result<Instance, CoreError> {
        self.records.get(&id).cloned().ok_or(CoreError::NotFound(id))
    }

    /// Copies of all records in insertion order
    #[must_use]
    pub fn list_all(&self) -> Vec<Instance> {
        self.records.values().cloned().collect()
    }

    /// Overwrite the status of a record
    ///
    /// The change timestamp and revision only move when the status changes.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the id is unknown
    pub fn set_status(
        &mut self,
        id: InstanceId,
        status: InstanceStatus,
    ) -> Result<Instance, CoreError> {
        let record = self.records.get_mut(&id).ok_or(CoreError::NotFound(id))?;

        if record.status == status {
            debug!(instance_id = %id, status = %status, "status unchanged");
            return Ok(record.clone());
        }

        let old_status = record.status;
        record.status = status;
        record.last_status_change = Utc::now();
        record.revision += 1;

        info!(
            instance_id = %id,
            from = %old_status,
            to = %status,
            "status transition"
        );

        Ok(record.clone())
    }

    /// Overwrite the status only if nobody else changed it since
    /// `expected_revision`
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the record was deleted or
    /// `CoreError::StaleRevision` if its status was changed in between
    pub fn compare_and_set_status(
        &mut self,
        id: InstanceId,
        status: InstanceStatus,
        expected_revision: u64,
    ) -> Result<Instance, CoreError> {
        let current = self.records.get(&id).ok_or(CoreError::NotFound(id))?;
        if current.revision != expected_revision {
            return Err(CoreError::StaleRevision(id));
        }
        self.set_status(id, status)
    }
}

impl Actor for InstanceStore {
    type Args = Self;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(id = %actor_ref.id(), instances = args.len(), "InstanceStore starting");
        Ok(args)
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, instances = self.records.len(), "InstanceStore stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<AddInstance> for InstanceStore {
    type Reply = Result<Instance, CoreError>;

    async fn handle(
        &mut self,
        msg: AddInstance,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.add(&msg.input)
    }
}

impl Message<UpdateInstance> for InstanceStore {
    type Reply = Result<Instance, CoreError>;

    async fn handle(
        &mut self,
        msg: UpdateInstance,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.update(msg.id, &msg.input)
    }
}

impl Message<DeleteInstance> for InstanceStore {
    type Reply = Result<(), CoreError>;

    async fn handle(
        &mut self,
        msg: DeleteInstance,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.delete(msg.id)
    }
}

impl Message<GetInstance> for InstanceStore {
    type Reply = Result<Instance, CoreError>;

    async fn handle(
        &mut self,
        msg: GetInstance,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.get(msg.id)
    }
}

impl Message<ListInstances> for InstanceStore {
    type Reply = Vec<Instance>;

    async fn handle(
        &mut self,
        _msg: ListInstances,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.list_all()
    }
}

impl Message<SetStatus> for InstanceStore {
    type Reply = Result<Instance, CoreError>;

    async fn handle(
        &mut self,
        msg: SetStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.set_status(msg.id, msg.status)
    }
}

impl Message<CompareAndSetStatus> for InstanceStore {
    type Reply = Result<Instance, CoreError>;

    async fn handle(
        &mut self,
        msg: CompareAndSetStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.compare_and_set_status(msg.id, msg.status, msg.expected_revision)
    }
}

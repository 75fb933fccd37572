//! `LifecycleController`: start/stop/redeploy state machine
//!
//! Holds the in-flight table and nothing else; every status read and write
//! goes through the `InstanceStore` actor. Messages are handled one at a
//! time, so the busy check and the immediate write cannot interleave with
//! another request for the same instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use central_api::events::{OutcomeEvent, OutcomeKind};

use crate::actor::{InstanceStore, flatten};
use crate::config::LifecycleConfig;
use crate::error::CoreError;
use crate::handle::TransitionHandle;
use crate::instance::{Instance, InstanceId};
use crate::message::{
    Cancel, CompareAndSetStatus, GetInstance, IsInFlight, Redeploy, SetStatus, Settle, Start,
    Stop,
};
use crate::notify::NotificationSink;
use crate::state::{InstanceStatus, TransitionKind};

/// Arguments for spawning a `LifecycleController`
pub struct LifecycleControllerArgs {
    /// Store owning the instance records
    pub store: ActorRef<InstanceStore>,
    /// Deploy delays
    pub config: LifecycleConfig,
    /// Receiver of outcome events
    pub sink: Arc<dyn NotificationSink>,
}

/// A transition between its immediate write and its delayed commit
struct InFlight {
    kind: TransitionKind,
    /// Distinguishes this flight from earlier ones on the same instance
    generation: u64,
    /// Record revision right after the immediate write
    revision: u64,
    timer: AbortHandle,
    reply: oneshot::Sender<OutcomeEvent>,
}

/// Drives lifecycle transitions, at most one in flight per instance
pub struct LifecycleController {
    store: ActorRef<InstanceStore>,
    config: LifecycleConfig,
    sink: Arc<dyn NotificationSink>,
    in_flight: HashMap<InstanceId, InFlight>,
    next_generation: u64,
    /// Handed to timer tasks so they can report back
    myself: WeakActorRef<Self>,
}

impl LifecycleController {
    /// Deliver an outcome to the sink
    fn emit(&self, event: &OutcomeEvent) {
        debug!(
            instance_id = event.instance_id,
            kind = %event.kind,
            "emitting outcome"
        );
        self.sink.on_outcome(event);
    }

    /// Report a rejected request and hand the error back to the caller
    fn reject(&self, id: InstanceId, kind: TransitionKind, err: CoreError) -> CoreError {
        let outcome = match err {
            CoreError::Busy(_) => OutcomeKind::Busy,
            _ => OutcomeKind::TransitionFailed,
        };
        warn!(instance_id = %id, transition = %kind, error = %err, "transition rejected");
        self.emit(&OutcomeEvent::new(
            id.get(),
            outcome,
            format!("{kind} rejected: {err}"),
        ));
        err
    }

    /// Emit the final outcome of a flight and resolve its handle
    fn finish(&self, reply: oneshot::Sender<OutcomeEvent>, event: OutcomeEvent) {
        self.emit(&event);
        // The caller may have dropped the handle
        let _ = reply.send(event);
    }

    async fn fetch(&self, id: InstanceId) -> Result<Instance, CoreError> {
        flatten(self.store.ask(GetInstance { id }).await)
    }

    async fn write_status(
        &self,
        id: InstanceId,
        status: InstanceStatus,
    ) -> Result<Instance, CoreError> {
        flatten(self.store.ask(SetStatus { id, status }).await)
    }

    /// Accept or reject a transition request
    async fn begin(
        &mut self,
        id: InstanceId,
        kind: TransitionKind,
    ) -> Result<TransitionHandle, CoreError> {
        // A deleted instance is not found even while its old flight is pending
        let instance = match self.fetch(id).await {
            Ok(instance) => instance,
            Err(err) => return Err(self.reject(id, kind, err)),
        };

        if self.in_flight.contains_key(&id) {
            return Err(self.reject(id, kind, CoreError::Busy(id)));
        }

        if kind == TransitionKind::Start && instance.status == InstanceStatus::Running {
            info!(instance_id = %id, "start ignored, already running");
            let event = OutcomeEvent::new(
                id.get(),
                OutcomeKind::AlreadyRunning,
                format!("{} is already running", instance.name),
            );
            self.emit(&event);
            return Ok(TransitionHandle::resolved(event));
        }

        let written = match self.write_status(id, kind.immediate_status()).await {
            Ok(written) => written,
            Err(err) => return Err(self.reject(id, kind, err)),
        };

        match self.config.delay_for(kind) {
            Some(delay) => Ok(self.schedule(&written, kind, delay)),
            None => {
                let event = OutcomeEvent::new(
                    id.get(),
                    kind.completed_outcome(),
                    format!("{} {}", written.name, kind.completed_outcome()),
                );
                self.emit(&event);
                Ok(TransitionHandle::resolved(event))
            }
        }
    }

    /// Register a flight and spawn the timer that settles it
    fn schedule(
        &mut self,
        instance: &Instance,
        kind: TransitionKind,
        delay: Duration,
    ) -> TransitionHandle {
        let id = instance.id;
        let generation = self.next_generation;
        self.next_generation += 1;

        let controller = self.myself.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(controller) = controller.upgrade() else {
                return;
            };
            if let Err(e) = controller.ask(Settle { id, generation }).await {
                warn!(instance_id = %id, error = %e, "failed to settle transition");
            }
        })
        .abort_handle();

        let (reply, handle) = TransitionHandle::pending(id);
        self.in_flight.insert(
            id,
            InFlight {
                kind,
                generation,
                revision: instance.revision,
                timer,
                reply,
            },
        );

        info!(
            instance_id = %id,
            transition = %kind,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "transition scheduled"
        );

        handle
    }
}

impl Actor for LifecycleController {
    type Args = LifecycleControllerArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        args.config.validate()?;

        info!(
            id = %actor_ref.id(),
            start_delay_ms = args.config.start_delay_ms,
            redeploy_delay_ms = args.config.redeploy_delay_ms,
            "LifecycleController starting"
        );

        Ok(Self {
            store: args.store,
            config: args.config,
            sink: args.sink,
            in_flight: HashMap::new(),
            next_generation: 0,
            myself: actor_ref.downgrade(),
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(
            reason = ?reason,
            in_flight = self.in_flight.len(),
            "LifecycleController stopping"
        );

        // Every pending call still gets its one outcome
        for (id, flight) in std::mem::take(&mut self.in_flight) {
            flight.timer.abort();
            let event = OutcomeEvent::new(
                id.get(),
                OutcomeKind::TransitionFailed,
                format!("{} of instance {id} abandoned: controller stopped", flight.kind),
            );
            self.finish(flight.reply, event);
        }

        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Start> for LifecycleController {
    type Reply = Result<TransitionHandle, CoreError>;

    async fn handle(&mut self, msg: Start, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.begin(msg.id, TransitionKind::Start).await
    }
}

impl Message<Stop> for LifecycleController {
    type Reply = Result<TransitionHandle, CoreError>;

    async fn handle(&mut self, msg: Stop, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.begin(msg.id, TransitionKind::Stop).await
    }
}

impl Message<Redeploy> for LifecycleController {
    type Reply = Result<TransitionHandle, CoreError>;

    async fn handle(
        &mut self,
        msg: Redeploy,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.begin(msg.id, TransitionKind::Redeploy).await
    }
}

impl Message<Cancel> for LifecycleController {
    type Reply = Result<(), CoreError>;

    async fn handle(&mut self, msg: Cancel, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let id = msg.id;
        let flight = self
            .in_flight
            .remove(&id)
            .ok_or(CoreError::NotInFlight(id))?;
        flight.timer.abort();

        let event = match self.write_status(id, InstanceStatus::Stopped).await {
            Ok(instance) => {
                info!(instance_id = %id, transition = %flight.kind, "transition cancelled");
                OutcomeEvent::new(
                    id.get(),
                    OutcomeKind::Cancelled,
                    format!("{} of {} cancelled", flight.kind, instance.name),
                )
            }
            Err(err) => {
                warn!(instance_id = %id, error = %err, "cancelled transition could not stop instance");
                OutcomeEvent::new(
                    id.get(),
                    OutcomeKind::TransitionFailed,
                    format!("{} of instance {id} failed: {err}", flight.kind),
                )
            }
        };

        self.finish(flight.reply, event);
        Ok(())
    }
}

impl Message<Settle> for LifecycleController {
    type Reply = ();

    async fn handle(&mut self, msg: Settle, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let id = msg.id;
        let Some(flight) = self.in_flight.remove(&id) else {
            debug!(instance_id = %id, "settle for cancelled transition ignored");
            return;
        };
        if flight.generation != msg.generation {
            debug!(instance_id = %id, "stale settle ignored");
            self.in_flight.insert(id, flight);
            return;
        }

        let Some(status) = flight.kind.delayed_status() else {
            return;
        };

        let result = flatten(
            self.store
                .ask(CompareAndSetStatus {
                    id,
                    status,
                    expected_revision: flight.revision,
                })
                .await,
        );

        let event = match result {
            Ok(instance) => {
                let outcome = flight.kind.completed_outcome();
                info!(instance_id = %id, transition = %flight.kind, "transition completed");
                OutcomeEvent::new(id.get(), outcome, format!("{} {outcome}", instance.name))
            }
            Err(err) => {
                warn!(
                    instance_id = %id,
                    transition = %flight.kind,
                    error = %err,
                    "transition failed"
                );
                OutcomeEvent::new(
                    id.get(),
                    OutcomeKind::TransitionFailed,
                    format!("{} of instance {id} failed: {err}", flight.kind),
                )
            }
        };

        self.finish(flight.reply, event);
    }
}

impl Message<IsInFlight> for LifecycleController {
    type Reply = bool;

    async fn handle(
        &mut self,
        msg: IsInFlight,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.in_flight.contains_key(&msg.id)
    }
}

//! Completion handle returned by lifecycle calls

use tokio::sync::oneshot;

use central_api::events::OutcomeEvent;

use crate::error::CoreError;
use crate::instance::InstanceId;

/// Resolves with the single outcome of a start/stop/redeploy call
///
/// Short-circuit outcomes (stop, already running) are resolved before the
/// handle is returned. Dropping the handle does not cancel the transition.
#[derive(Debug)]
pub struct TransitionHandle {
    instance_id: InstanceId,
    rx: oneshot::Receiver<OutcomeEvent>,
}

impl TransitionHandle {
    /// Handle completed later through the returned sender
    pub(crate) fn pending(instance_id: InstanceId) -> (oneshot::Sender<OutcomeEvent>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { instance_id, rx })
    }

    /// Handle that is already complete
    pub(crate) fn resolved(event: OutcomeEvent) -> Self {
        let (tx, handle) = Self::pending(InstanceId::new(event.instance_id));
        // The receiver lives in `handle`, so this cannot fail
        let _ = tx.send(event);
        handle
    }

    /// Instance the call targeted
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Outcome if the transition has already finished
    pub fn try_outcome(&mut self) -> Option<OutcomeEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the transition to finish
    ///
    /// # Errors
    /// Returns `CoreError::ActorError` if the lifecycle controller stopped
    /// before reporting an outcome
    pub async fn wait(self) -> Result<OutcomeEvent, CoreError> {
        let instance_id = self.instance_id;
        self.rx.await.map_err(|_| {
            CoreError::ActorError(format!(
                "lifecycle controller dropped transition for instance {instance_id}"
            ))
        })
    }
}

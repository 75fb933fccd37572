//! Notification seam for lifecycle outcomes
//!
//! Sinks are called from inside the lifecycle actor and must return
//! promptly. Delivery failures are the sink's problem; they never undo a
//! state change.

use tokio::sync::broadcast;

use central_api::events::OutcomeEvent;

/// Receives exactly one outcome per lifecycle call
pub trait NotificationSink: Send + Sync {
    /// Called once per start/stop/redeploy request
    fn on_outcome(&self, event: &OutcomeEvent);
}

impl NotificationSink for broadcast::Sender<OutcomeEvent> {
    fn on_outcome(&self, event: &OutcomeEvent) {
        // No subscribers is fine
        let _ = self.send(event.clone());
    }
}

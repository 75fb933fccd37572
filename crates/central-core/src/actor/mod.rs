//! Actor implementations

pub mod lifecycle;
pub mod store;

pub use lifecycle::{LifecycleController, LifecycleControllerArgs};
pub use store::InstanceStore;

use kameo::error::SendError;

use crate::error::CoreError;

/// Unwrap handler errors from an `ask`, mapping mailbox failures to `ActorError`
pub(crate) fn flatten<M, T>(result: Result<T, SendError<M, CoreError>>) -> Result<T, CoreError> {
    result.map_err(|e| match e {
        SendError::HandlerError(err) => err,
        other => CoreError::ActorError(other.to_string()),
    })
}

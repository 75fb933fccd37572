//! central-core: Instance lifecycle and query engine
//!
//! Implements the `InstanceStore` and `LifecycleController` actors using the
//! kameo framework, the pure query functions used for search and filter, and
//! the `Console` facade tying them together.

pub mod actor;
pub mod config;
pub mod console;
pub mod error;
pub mod handle;
pub mod instance;
pub mod logs;
pub mod message;
pub mod notify;
pub mod query;
pub mod state;
pub mod validate;

pub use actor::{InstanceStore, LifecycleController, LifecycleControllerArgs};
pub use config::LifecycleConfig;
pub use console::Console;
pub use error::{CoreError, Field};
pub use handle::TransitionHandle;
pub use instance::{Instance, InstanceId};
pub use logs::{LogLevel, LogSource};
pub use message::{
    AddInstance, Cancel, CompareAndSetStatus, DeleteInstance, GetInstance, IsInFlight,
    ListInstances, Redeploy, SetStatus, Settle, Start, Stop, UpdateInstance,
};
pub use notify::NotificationSink;
pub use query::{InstanceQuery, StatusFilter};
pub use state::{InstanceStatus, TransitionKind};

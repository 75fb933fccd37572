//! Log retrieval seam
//!
//! Log lines are opaque to the core: they are neither validated nor stored.

use async_trait::async_trait;

use crate::instance::InstanceId;

/// External source of log lines for an instance
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch log lines, oldest first
    async fn logs(&self, id: InstanceId) -> Vec<String>;
}

/// Severity tag found in a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Classify a line by its `[ERROR]` / `[WARN]` tag, defaulting to info
    #[must_use]
    pub fn classify(line: &str) -> Self {
        if line.contains("[ERROR]") {
            LogLevel::Error
        } else if line.contains("[WARN]") {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }
}

//! Demo log source
//!
//! Produces a fixed set of lines; a real deployment would read them from
//! the instance host.

use async_trait::async_trait;
use chrono::Local;

use central_core::{InstanceId, LogSource};

/// Canned log lines stamped with the current time
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoLogSource;

#[async_trait]
impl LogSource for DemoLogSource {
    async fn logs(&self, id: InstanceId) -> Vec<String> {
        let now = Local::now().format("%H:%M:%S");
        vec![
            format!("[INFO] Server started successfully at {now}"),
            "[INFO] User 'Admin' logged in".to_string(),
            "[WARN] High memory usage detected (85%)".to_string(),
            format!("[ERROR] Deployment failed for instance Tomcat#{id}"),
            format!("[INFO] Instance Tomcat#{id} restarted"),
            "[INFO] System running normally".to_string(),
        ]
    }
}

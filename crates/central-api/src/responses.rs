//! Response types for list views

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counter shown under a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    /// Instances matching the current filter
    pub visible: usize,
    /// Instances in the store
    pub total: usize,
}

impl fmt::Display for ListSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {} of {} instances", self.visible, self.total)
    }
}

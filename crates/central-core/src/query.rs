//! Search and filter over instance snapshots
//!
//! Everything here is pure: a query reads a snapshot slice and returns a
//! new vector in the snapshot's order.

use std::str::FromStr;

use crate::error::CoreError;
use crate::instance::Instance;
use crate::state::InstanceStatus;

/// Status filter, `All` disables status filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(InstanceStatus),
}

impl StatusFilter {
    fn matches(self, status: InstanceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl From<InstanceStatus> for StatusFilter {
    fn from(status: InstanceStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Keyword plus status filter, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceQuery {
    /// Lowercased keyword, `None` when blank
    keyword: Option<String>,
    status: StatusFilter,
}

impl InstanceQuery {
    /// Query matching every instance
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring matched against name or status
    #[must_use]
    pub fn keyword(mut self, keyword: &str) -> Self {
        let keyword = keyword.trim();
        self.keyword = (!keyword.is_empty()).then(|| keyword.to_lowercase());
        self
    }

    /// Restrict to one status
    #[must_use]
    pub fn status(mut self, filter: StatusFilter) -> Self {
        self.status = filter;
        self
    }

    /// Whether a single instance passes both predicates
    #[must_use]
    pub fn matches(&self, instance: &Instance) -> bool {
        let text_ok = self.keyword.as_deref().is_none_or(|keyword| {
            instance.name.to_lowercase().contains(keyword)
                || instance.status.as_str().to_lowercase().contains(keyword)
        });
        text_ok && self.status.matches(instance.status)
    }

    /// Evaluate over a snapshot, preserving its order
    #[must_use]
    pub fn apply(&self, snapshot: &[Instance]) -> Vec<Instance> {
        snapshot
            .iter()
            .filter(|instance| self.matches(instance))
            .cloned()
            .collect()
    }
}

/// Instances whose name or status contains `keyword`
#[must_use]
pub fn search(snapshot: &[Instance], keyword: &str) -> Vec<Instance> {
    InstanceQuery::new().keyword(keyword).apply(snapshot)
}

/// Instances with the given status
#[must_use]
pub fn filter(snapshot: &[Instance], status: StatusFilter) -> Vec<Instance> {
    InstanceQuery::new().status(status).apply(snapshot)
}

/// Keyword search restricted to a status
#[must_use]
pub fn search_and_filter(snapshot: &[Instance], keyword: &str, status: StatusFilter) -> Vec<Instance> {
    InstanceQuery::new()
        .keyword(keyword)
        .status(status)
        .apply(snapshot)
}

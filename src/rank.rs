//! Priority ranking for ready issues.
//!
//! Produces a total order over ready issues using the issue's priority
//! string. An absent or unrecognized priority sorts after all four known
//! levels. The sort is stable: issues sharing a rank keep the order the
//! store returned them in, so the store's own secondary ordering (age, id)
//! is preserved as the tie-break.

use crate::store::ReadyIssue;

/// Known priority levels, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

/// Rank assigned to an absent or unrecognized priority.
pub const UNKNOWN_RANK: u8 = 4;

impl Priority {
    /// Parse a priority from its wire string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Sort key: critical=0 < high=1 < normal=2 < low=3.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }
}

/// Rank of an optional priority string; unknown values rank worst.
pub fn rank_of(priority: Option<&str>) -> u8 {
    priority
        .and_then(Priority::from_str)
        .map(Priority::rank)
        .unwrap_or(UNKNOWN_RANK)
}

/// Stable-sort issues into dispatch order, best rank first.
pub fn sort_by_rank(issues: &mut [ReadyIssue]) {
    issues.sort_by_key(|issue| rank_of(issue.priority.as_deref()));
}

//! Per-item sync outcomes and their aggregate report

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened to one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
    /// Exists remotely with no local counterpart; left for manual removal.
    Orphaned,
    Failed(String),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Orphaned => "orphaned",
            SyncOutcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome of one item in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub course: String,
    pub item: String,
    pub outcome: SyncOutcome,
}

/// Outcome counts, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub orphaned: usize,
    pub failed: usize,
}

/// Report from a sync command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Outcome of every item, in input order
    pub items: Vec<ItemReport>,
    /// Writes performed (or, in a dry run, prefixed "[dry-run] Would ...")
    /// that are not item outcomes, such as reorders
    pub actions: Vec<String>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, course: impl Into<String>, item: impl Into<String>, outcome: SyncOutcome) {
        self.items.push(ItemReport {
            course: course.into(),
            item: item.into(),
            outcome,
        });
    }

    pub fn action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    /// Append another report's items and actions.
    pub fn merge(&mut self, other: SyncReport) {
        self.items.extend(other.items);
        self.actions.extend(other.actions);
    }

    /// Whether no item failed.
    pub fn success(&self) -> bool {
        !self.items.iter().any(|i| i.outcome.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| i.outcome.is_failure())
    }

    /// Outcome of the first item named `item`.
    pub fn outcome_of(&self, item: &str) -> Option<&SyncOutcome> {
        self.items.iter().find(|i| i.item == item).map(|i| &i.outcome)
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for item in &self.items {
            match item.outcome {
                SyncOutcome::Created => counts.created += 1,
                SyncOutcome::Updated => counts.updated += 1,
                SyncOutcome::Unchanged => counts.unchanged += 1,
                SyncOutcome::Orphaned => counts.orphaned += 1,
                SyncOutcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }
}

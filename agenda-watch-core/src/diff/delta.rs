use std::fmt;

use crate::diff::{DayGranularity, FieldDiff};
use crate::event::Event;
use crate::snapshot::Snapshot;

/// An event present in both snapshots whose attributes changed.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedEvent {
    pub id: String,
    pub before: Event,
    pub after: Event,
    pub diff: FieldDiff,
}

/// Everything that changed between two snapshots. Each list is ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub added: Vec<Event>,
    pub removed: Vec<Event>,
    pub edited: Vec<EditedEvent>,
}

/// Event counts per category, for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaSummary {
    pub added: usize,
    pub removed: usize,
    pub edited: usize,
}

impl fmt::Display for DeltaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{} ~{}", self.added, self.removed, self.edited)
    }
}

impl Delta {
    pub fn compare(before: &Snapshot, after: &Snapshot) -> Delta {
        Self::compare_with(before, after, DayGranularity::default())
    }

    /// Classify every id by set membership: only in `after` is added, only
    /// in `before` is removed, in both is edited when any field differs.
    /// An id present on both sides is never reported as removed and added.
    pub fn compare_with(before: &Snapshot, after: &Snapshot, granularity: DayGranularity) -> Delta {
        let added = after
            .iter()
            .filter(|e| !before.contains(&e.id))
            .cloned()
            .collect();

        let removed = before
            .iter()
            .filter(|e| !after.contains(&e.id))
            .cloned()
            .collect();

        let edited = before
            .iter()
            .filter_map(|old| {
                let new = after.get(&old.id)?;
                let diff = FieldDiff::compare_with(old, new, granularity);
                diff.has_diff().then(|| EditedEvent {
                    id: old.id.clone(),
                    before: old.clone(),
                    after: new.clone(),
                    diff,
                })
            })
            .collect();

        Delta {
            added,
            removed,
            edited,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.edited.is_empty()
    }

    pub fn summary(&self) -> DeltaSummary {
        DeltaSummary {
            added: self.added.len(),
            removed: self.removed.len(),
            edited: self.edited.len(),
        }
    }
}

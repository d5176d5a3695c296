//! In-memory baseline holder.

use crate::snapshot::Snapshot;

/// Holds the snapshot the next fetch is compared against.
///
/// The store has no comparison logic. It is owned by whoever drives the
/// fetch cycle, and replacing the baseline requires `&mut`.
#[derive(Debug, Default)]
pub struct EventStore {
    baseline: Option<Snapshot>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current baseline, if a snapshot was ever stored.
    pub fn get(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    /// Replace the baseline wholesale, returning the previous one.
    pub fn set(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.baseline.replace(snapshot)
    }
}

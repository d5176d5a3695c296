//! All events known as of one fetch, keyed by id.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone};

use crate::event::Event;

/// A complete set of events from one fetch.
///
/// Events are ordered by id so that anything derived from a snapshot
/// comes out in the same order every time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    events: BTreeMap<String, Event>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a list of events. When an id appears more than
    /// once the last occurrence wins.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut map = BTreeMap::new();
        for event in events {
            if let Some(previous) = map.insert(event.id.clone(), event) {
                tracing::warn!(id = %previous.id, "Duplicate event id in feed, keeping the last one");
            }
        }
        Snapshot { events: map }
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Events ending after `now`, soonest first.
    pub fn upcoming<Z: TimeZone>(&self, now: &DateTime<Z>, limit: usize) -> Vec<&Event> {
        let mut upcoming: Vec<_> = self.events.values().filter(|e| e.end > *now).collect();
        upcoming.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        upcoming.truncate(limit);
        upcoming
    }
}

impl FromIterator<Event> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Snapshot::from_events(iter)
    }
}

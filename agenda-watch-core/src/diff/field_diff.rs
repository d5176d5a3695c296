use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::event::{Event, clock_time};

/// How the `day` flag decides whether two starts fall on the same day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayGranularity {
    /// Year, month and day of month must all match.
    #[default]
    CalendarDate,
    /// Year, month and weekday must match. Two starts exactly one week
    /// apart in the same month count as the same day. Kept for feeds that
    /// were set up against this older behaviour.
    Weekday,
}

impl DayGranularity {
    pub fn same_day(&self, a: &Event, b: &Event) -> bool {
        let (a, b) = (a.start_date(), b.start_date());
        match self {
            DayGranularity::CalendarDate => a == b,
            DayGranularity::Weekday => {
                a.weekday() == b.weekday() && a.month() == b.month() && a.year() == b.year()
            }
        }
    }
}

/// Which attributes differ between two versions of the same event.
///
/// `start` and `end` only look at the clock time, `day` only at the
/// calendar date of the start. Moving an event to another day at the same
/// hour sets `day` alone; a full reschedule sets both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub summary: bool,
    pub start: bool,
    pub end: bool,
    pub day: bool,
    pub location: bool,
    pub description: bool,
}

impl FieldDiff {
    pub fn compare(before: &Event, after: &Event) -> FieldDiff {
        Self::compare_with(before, after, DayGranularity::default())
    }

    pub fn compare_with(before: &Event, after: &Event, granularity: DayGranularity) -> FieldDiff {
        FieldDiff {
            summary: before.summary != after.summary,
            start: clock_time(&before.start) != clock_time(&after.start),
            end: clock_time(&before.end) != clock_time(&after.end),
            day: !granularity.same_day(before, after),
            location: before.location_or_empty() != after.location_or_empty(),
            description: before.description_or_empty() != after.description_or_empty(),
        }
    }

    /// At least one attribute changed.
    pub fn has_diff(&self) -> bool {
        self.summary || self.start || self.end || self.day || self.location || self.description
    }

    /// Names of the attributes that changed, in a fixed order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("summary", self.summary),
            ("start", self.start),
            ("end", self.end),
            ("day", self.day),
            ("location", self.location),
            ("description", self.description),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

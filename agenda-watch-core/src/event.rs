//! Calendar event type.
//!
//! Events come out of feed ingestion already normalized. Start and end are
//! kept in the display timezone, so their date and clock-time components
//! are the ones a reader of the notification sees.

use std::fmt;

use chrono::{DateTime, NaiveDate, Timelike};
use chrono_tz::Tz;

/// A single calendar occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Stable identifier, unique within a snapshot
    pub id: String,
    pub summary: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        summary: impl Into<String>,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> Self {
        Event {
            id: id.into(),
            summary: summary.into(),
            start,
            end,
            location: None,
            description: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Location with absent treated as empty.
    pub fn location_or_empty(&self) -> &str {
        self.location.as_deref().unwrap_or("")
    }

    /// Description with absent treated as empty.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Calendar date of the start, in the event's timezone.
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// Hour, minute and second of a timestamp. Sub-second precision is ignored.
pub fn clock_time(dt: &DateTime<Tz>) -> (u32, u32, u32) {
    (dt.hour(), dt.minute(), dt.second())
}

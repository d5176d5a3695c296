//! iCalendar feed ingestion.

mod parse;

pub use parse::{parse_calendar, parse_snapshot};

//! Read an iCalendar feed into events using the icalendar crate's parser.

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use crate::error::{FetchError, FetchResult};
use crate::event::Event;
use crate::normalize::Normalizer;
use crate::snapshot::Snapshot;

/// Parse every VEVENT of a feed. Times are converted to `display_tz`;
/// floating and all-day values are read as local to it.
///
/// Events without UID or DTSTART are skipped. An overridden occurrence of
/// a recurring event (one with RECURRENCE-ID) gets `UID@RECURRENCE-ID` as
/// its id so it does not collide with the series.
pub fn parse_calendar(content: &str, display_tz: Tz) -> FetchResult<Vec<Event>> {
    if !content.contains("BEGIN:VCALENDAR") {
        return Err(FetchError::Parse("not an iCalendar document".into()));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| FetchError::Parse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    Ok(vevents
        .into_iter()
        .filter_map(|vevent| parse_vevent(vevent, display_tz))
        .collect())
}

/// Parse a feed and normalize its events into a snapshot.
pub fn parse_snapshot(
    content: &str,
    display_tz: Tz,
    normalizer: &Normalizer,
) -> FetchResult<Snapshot> {
    let events = parse_calendar(content, display_tz)?;
    Ok(events.into_iter().map(|e| normalizer.normalize(e)).collect())
}

fn collect_vevents<'c, 'a>(components: &'c [Component<'a>], out: &mut Vec<&'c Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn parse_vevent(vevent: &Component, display_tz: Tz) -> Option<Event> {
    let Some(uid) = vevent.find_prop("UID").map(|p| p.val.to_string()) else {
        tracing::debug!("Skipping VEVENT without UID");
        return None;
    };

    let Some(start) = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(|t| to_display_time(t, display_tz))
    else {
        tracing::debug!(uid = %uid, "Skipping VEVENT without a readable DTSTART");
        return None;
    };

    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(|t| to_display_time(t, display_tz))
        .or_else(|| {
            let duration = vevent.find_prop("DURATION")?;
            let duration = iso8601::duration(duration.val.as_ref()).ok()?;
            let duration: std::time::Duration = duration.into();
            Some(start + chrono::Duration::from_std(duration).ok()?)
        })
        .unwrap_or(start);

    let id = match vevent.find_prop("RECURRENCE-ID") {
        Some(recurrence_id) => format!("{}@{}", uid, recurrence_id.val.as_ref()),
        None => uid,
    };

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_else(|| "(No title)".to_string());
    let location = vevent
        .find_prop("LOCATION")
        .map(|p| unescape_text(p.val.as_ref()));
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(p.val.as_ref()));

    Some(Event {
        id,
        summary,
        start,
        end,
        location,
        description,
    })
}

/// Convert icalendar's DatePerhapsTime into the display timezone.
fn to_display_time(dpt: DatePerhapsTime, display_tz: Tz) -> DateTime<Tz> {
    match dpt {
        DatePerhapsTime::Date(date) => resolve_local(date.and_time(NaiveTime::MIN), display_tz),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => dt.with_timezone(&display_tz),
            CalendarDateTime::Floating(naive) => resolve_local(naive, display_tz),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                resolve_local(date_time, parse_tzid(&tzid)).with_timezone(&display_tz)
            }
        },
    }
}

/// Interpret a wall-clock time in `zone`. Ambiguous times (DST fall-back)
/// take the earlier instant; nonexistent ones (DST gap) are read as UTC.
fn resolve_local(naive: NaiveDateTime, zone: Tz) -> DateTime<Tz> {
    zone.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| zone.from_utc_datetime(&naive))
}

fn parse_tzid(tzid: &str) -> Tz {
    let name = tzid.trim_matches('"').trim_start_matches('/');
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::debug!(tzid = %tzid, "Unknown TZID, falling back to UTC");
        Tz::UTC
    })
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

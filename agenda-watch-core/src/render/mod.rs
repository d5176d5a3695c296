//! Turn a delta into notification fields.
//!
//! Each changed event becomes one `Field`. Changed attributes of an edited
//! event are shown as `~~old~~ **new**`. Dates and times are written as
//! Discord timestamp tokens (`<t:UNIX:STYLE>`), which the client localizes,
//! so the output only depends on the delta itself.

mod labels;
mod segment;

pub use labels::{Labels, Language};
pub use segment::Segment;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::diff::{Delta, DiffKind, FieldDiff};
use crate::event::Event;

/// One titled, colored bundle of fields for a delta category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderGroup {
    pub title: String,
    pub kind: DiffKind,
    pub color: u32,
    pub fields: Vec<Field>,
}

/// A display-ready event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Copy)]
enum TimestampStyle {
    LongDate,
    Relative,
    ShortTime,
}

impl TimestampStyle {
    fn code(self) -> char {
        match self {
            TimestampStyle::LongDate => 'D',
            TimestampStyle::Relative => 'R',
            TimestampStyle::ShortTime => 't',
        }
    }
}

fn timestamp(dt: &DateTime<Tz>, style: TimestampStyle) -> String {
    format!("<t:{}:{}>", dt.timestamp(), style.code())
}

fn date_tokens(dt: &DateTime<Tz>) -> String {
    format!(
        "{} {}",
        timestamp(dt, TimestampStyle::LongDate),
        timestamp(dt, TimestampStyle::Relative)
    )
}

/// The pieces of a field before they are formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParts {
    pub title: Segment,
    pub date: Segment,
    pub location: Option<Segment>,
    pub start: Segment,
    pub end: Segment,
    pub description: Option<String>,
}

impl FieldParts {
    /// An added or removed event, without markup.
    pub fn single(event: &Event) -> Self {
        Self::edited(event, event, &FieldDiff::default())
    }

    pub fn edited(before: &Event, after: &Event, diff: &FieldDiff) -> Self {
        // Shown when either side has a location
        let location = Segment::pick(
            diff.location,
            before.location_or_empty(),
            after.location_or_empty(),
        );

        FieldParts {
            title: Segment::pick(diff.summary, &before.summary, &after.summary),
            date: Segment::pick(diff.day, date_tokens(&before.start), date_tokens(&after.start)),
            location: Some(location).filter(|l| !l.is_empty()),
            start: Segment::pick(
                diff.start,
                timestamp(&before.start, TimestampStyle::ShortTime),
                timestamp(&after.start, TimestampStyle::ShortTime),
            ),
            end: Segment::pick(
                diff.end,
                timestamp(&before.end, TimestampStyle::ShortTime),
                timestamp(&after.end, TimestampStyle::ShortTime),
            ),
            description: Some(after.description_or_empty())
                .filter(|d| !d.is_empty())
                .map(String::from),
        }
    }

    pub fn to_field(&self, labels: &Labels) -> Field {
        let name = format!("{}\n ({})", self.title, self.date);

        let mut lines = Vec::new();
        if let Some(location) = &self.location {
            lines.push(format!("- 🚩 {}", location));
        }
        lines.push(format!("- ⏲️ {} - {}", self.start, self.end));
        lines.push(
            self.description
                .clone()
                .unwrap_or_else(|| labels.no_information.clone()),
        );

        Field {
            name,
            value: assemble_value(&lines, &labels.no_information),
            inline: true,
        }
    }
}

/// Join value lines, substituting the placeholder for an empty result.
fn assemble_value(lines: &[String], placeholder: &str) -> String {
    let value = lines.join("\n");
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}

fn group(kind: DiffKind, labels: &Labels, fields: Vec<Field>) -> Option<RenderGroup> {
    if fields.is_empty() {
        return None;
    }
    Some(RenderGroup {
        title: labels.title(kind).to_string(),
        kind,
        color: kind.color(),
        fields,
    })
}

/// Render a delta into at most three groups: added, removed, edited, in
/// that order. Empty categories produce no group.
pub fn render(delta: &Delta, labels: &Labels) -> Vec<RenderGroup> {
    let added = delta
        .added
        .iter()
        .map(|e| FieldParts::single(e).to_field(labels))
        .collect();
    let removed = delta
        .removed
        .iter()
        .map(|e| FieldParts::single(e).to_field(labels))
        .collect();
    let edited = delta
        .edited
        .iter()
        .map(|e| FieldParts::edited(&e.before, &e.after, &e.diff).to_field(labels))
        .collect();

    [
        group(DiffKind::Added, labels, added),
        group(DiffKind::Removed, labels, removed),
        group(DiffKind::Edited, labels, edited),
    ]
    .into_iter()
    .flatten()
    .collect()
}

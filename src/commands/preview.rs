use std::path::PathBuf;

use agenda_watch_core::diff::Delta;
use agenda_watch_core::render;
use anyhow::{Context, Result};

use crate::config::Settings;
use crate::notifier::render_text;
use crate::source::{CalendarSource, FileCalendarSource};

/// Diff two local .ics files and print the notification they would produce.
pub async fn run(settings: Settings, before: PathBuf, after: PathBuf) -> Result<()> {
    let read = |path: &PathBuf| FileCalendarSource::new(path, settings.timezone, settings.normalizer);

    let old = read(&before)
        .fetch()
        .await
        .with_context(|| format!("Failed to read {}", before.display()))?;
    let new = read(&after)
        .fetch()
        .await
        .with_context(|| format!("Failed to read {}", after.display()))?;

    let delta = Delta::compare_with(&old, &new, settings.day_granularity);
    if delta.is_empty() {
        println!("💤 No changes");
        return Ok(());
    }

    let groups = render::render(&delta, &settings.labels);
    println!("{}", render_text(&groups, &settings.labels.header));

    Ok(())
}

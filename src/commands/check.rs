use anyhow::Result;
use chrono::Utc;

use crate::config::Settings;
use crate::source::CalendarSource;

use super::http_source;

/// Number of upcoming events listed
const UPCOMING_LIMIT: usize = 10;

/// Fetch the feed once and show what would become the baseline.
pub async fn run(settings: Settings) -> Result<()> {
    let source = http_source(&settings)?;

    println!("📡 Fetching {}", settings.require_calendar_url()?);
    let snapshot = source.fetch().await?;
    if snapshot.is_empty() {
        println!("   The feed has no events");
        return Ok(());
    }
    println!("   {} events", snapshot.len());

    let now = Utc::now().with_timezone(&settings.timezone);
    let upcoming = snapshot.upcoming(&now, UPCOMING_LIMIT);
    if upcoming.is_empty() {
        println!("   No upcoming events");
        return Ok(());
    }

    println!("\nUpcoming:");
    for event in upcoming {
        println!(
            "   {} {}-{}  {}",
            event.start.format("%Y-%m-%d"),
            event.start.format("%H:%M"),
            event.end.format("%H:%M"),
            event
        );
    }

    Ok(())
}

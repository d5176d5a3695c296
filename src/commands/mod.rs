pub mod check;
pub mod preview;
pub mod watch;

use crate::config::Settings;
use crate::source::HttpCalendarSource;

/// Build the HTTP feed source described by the settings.
pub fn http_source(settings: &Settings) -> anyhow::Result<HttpCalendarSource> {
    Ok(HttpCalendarSource::new(
        settings.require_calendar_url()?.clone(),
        settings.request_timeout,
        settings.timezone,
        settings.normalizer,
    )?)
}

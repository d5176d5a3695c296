//! Where snapshots come from.

use std::path::PathBuf;
use std::time::Duration;

use agenda_watch_core::error::{FetchError, FetchResult};
use agenda_watch_core::ics;
use agenda_watch_core::normalize::Normalizer;
use agenda_watch_core::Snapshot;
use chrono_tz::Tz;
use url::Url;

/// Produces a fresh snapshot of the calendar.
pub trait CalendarSource {
    async fn fetch(&self) -> FetchResult<Snapshot>;
}

/// Parse a feed URL, accepting webcal:// as an alias for https://.
pub fn feed_url(raw: &str) -> FetchResult<Url> {
    let raw = raw.trim();
    let rewritten = match raw.strip_prefix("webcal://") {
        Some(rest) => format!("https://{}", rest),
        None => raw.to_string(),
    };

    let url = Url::parse(&rewritten).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

/// Downloads an ICS feed over HTTP(S).
pub struct HttpCalendarSource {
    client: reqwest::Client,
    url: Url,
    timezone: Tz,
    normalizer: Normalizer,
}

impl HttpCalendarSource {
    pub fn new(
        url: Url,
        timeout: Duration,
        timezone: Tz,
        normalizer: Normalizer,
    ) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(HttpCalendarSource {
            client,
            url,
            timezone,
            normalizer,
        })
    }
}

impl CalendarSource for HttpCalendarSource {
    async fn fetch(&self) -> FetchResult<Snapshot> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        ics::parse_snapshot(&body, self.timezone, &self.normalizer)
    }
}

/// Reads an ICS file from disk.
pub struct FileCalendarSource {
    path: PathBuf,
    timezone: Tz,
    normalizer: Normalizer,
}

impl FileCalendarSource {
    pub fn new(path: impl Into<PathBuf>, timezone: Tz, normalizer: Normalizer) -> Self {
        FileCalendarSource {
            path: path.into(),
            timezone,
            normalizer,
        }
    }
}

impl CalendarSource for FileCalendarSource {
    async fn fetch(&self) -> FetchResult<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        ics::parse_snapshot(&content, self.timezone, &self.normalizer)
    }
}

use std::time::Duration;

use anyhow::Result;

use crate::config::Settings;
use crate::notifier::{DiscordWebhook, StdoutNotifier};
use crate::watcher::Watcher;

use super::http_source;

pub async fn run(settings: Settings, dry_run: bool, interval: Option<Duration>) -> Result<()> {
    let source = http_source(&settings)?;
    let interval = interval.unwrap_or(settings.interval);
    let header = settings.labels.header.clone();

    if dry_run {
        let notifier = StdoutNotifier::new(header);
        Watcher::new(source, notifier, settings.labels, settings.day_granularity)
            .run(interval)
            .await;
    } else {
        let url = settings.require_webhook()?.clone();
        let notifier = DiscordWebhook::new(url, settings.request_timeout, header)?;
        Watcher::new(source, notifier, settings.labels, settings.day_granularity)
            .run(interval)
            .await;
    }

    Ok(())
}

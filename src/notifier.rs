//! Delivery of rendered change groups.

use std::time::Duration;

use agenda_watch_core::error::DeliveryError;
use agenda_watch_core::render::RenderGroup;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

/// Hands rendered groups to a destination.
pub trait Notifier {
    async fn deliver(&self, groups: &[RenderGroup]) -> Result<(), DeliveryError>;
}

// Discord webhook limits
const MAX_EMBED_TITLE: usize = 256;
const MAX_FIELD_NAME: usize = 256;
const MAX_FIELD_VALUE: usize = 1024;
const MAX_FIELDS_PER_EMBED: usize = 25;
const MAX_EMBEDS_PER_MESSAGE: usize = 10;
const MAX_CHARS_PER_MESSAGE: usize = 6000;

/// Longest wait honoured for a rate-limited webhook call
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn size(&self) -> usize {
        self.name.chars().count() + self.value.chars().count()
    }
}

impl Embed {
    /// Characters Discord counts toward the per-message total.
    fn size(&self) -> usize {
        self.title.chars().count() + self.fields.iter().map(EmbedField::size).sum::<usize>()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Packs fields into embeds and embeds into messages.
struct MessageBatch {
    messages: Vec<WebhookMessage>,
    embeds: Vec<Embed>,
    size: usize,
}

impl MessageBatch {
    fn new(header: &str) -> Self {
        MessageBatch {
            messages: Vec::new(),
            embeds: Vec::new(),
            size: header.chars().count(),
        }
    }

    /// Append `field` to the last embed when `continuing` the same group
    /// and it still fits; otherwise open a new embed for it.
    fn push_field(&mut self, group: &RenderGroup, field: EmbedField, continuing: bool) {
        let field_size = field.size();
        let fits = continuing
            && self.size + field_size <= MAX_CHARS_PER_MESSAGE
            && self
                .embeds
                .last()
                .is_some_and(|e| e.fields.len() < MAX_FIELDS_PER_EMBED);
        if !fits {
            self.open_embed(group, field_size);
        }

        self.size += field_size;
        if let Some(embed) = self.embeds.last_mut() {
            embed.fields.push(field);
        }
    }

    fn open_embed(&mut self, group: &RenderGroup, first_field_size: usize) {
        let title = truncate(&group.title, MAX_EMBED_TITLE);
        let title_size = title.chars().count();

        let message_full = self.embeds.len() == MAX_EMBEDS_PER_MESSAGE
            || (!self.embeds.is_empty()
                && self.size + title_size + first_field_size > MAX_CHARS_PER_MESSAGE);
        if message_full {
            self.flush();
        }

        self.size += title_size;
        self.embeds.push(Embed {
            title,
            color: group.color,
            fields: Vec::new(),
        });
    }

    fn flush(&mut self) {
        self.messages.push(WebhookMessage {
            content: None,
            embeds: std::mem::take(&mut self.embeds),
        });
        self.size = 0;
    }

    fn finish(mut self, header: &str) -> Vec<WebhookMessage> {
        if !self.embeds.is_empty() {
            self.flush();
        }
        if let Some(first) = self.messages.first_mut() {
            first.content = Some(header.to_string());
        }
        self.messages
    }
}

/// Split groups into webhook messages that stay within Discord's limits.
/// A group that runs out of fields or characters continues in another
/// embed with the same title and color. Only the first message carries
/// `header`, and it counts toward that message's character budget.
pub fn build_messages(groups: &[RenderGroup], header: &str) -> Vec<WebhookMessage> {
    let mut batch = MessageBatch::new(header);
    for group in groups {
        for (i, field) in group.fields.iter().enumerate() {
            let field = EmbedField {
                name: truncate(&field.name, MAX_FIELD_NAME),
                value: truncate(&field.value, MAX_FIELD_VALUE),
                inline: field.inline,
            };
            batch.push_field(group, field, i > 0);
        }
    }
    batch.finish(header)
}

/// Wait requested by a rate-limited response. Discord sends seconds,
/// possibly fractional; anything unreadable waits one second.
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::from_secs(1))
        .min(MAX_RATE_LIMIT_WAIT)
}

/// Posts embeds to a Discord webhook.
pub struct DiscordWebhook {
    client: reqwest::Client,
    url: Url,
    header: String,
}

impl DiscordWebhook {
    pub fn new(url: Url, timeout: Duration, header: String) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Http(e.to_string()))?;

        Ok(DiscordWebhook {
            client,
            url,
            header,
        })
    }

    async fn send(&self, message: &WebhookMessage) -> Result<reqwest::Response, DeliveryError> {
        self.client
            .post(self.url.clone())
            .json(message)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.to_string()))
    }

    /// Post one message, retrying once after a 429.
    async fn post(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        let mut response = self.send(message).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(response.headers());
            tracing::warn!(
                wait = %humantime::format_duration(wait),
                "Webhook rate limited, retrying once"
            );
            tokio::time::sleep(wait).await;
            response = self.send(message).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl Notifier for DiscordWebhook {
    async fn deliver(&self, groups: &[RenderGroup]) -> Result<(), DeliveryError> {
        for message in build_messages(groups, &self.header) {
            self.post(&message).await?;
            tracing::debug!(
                embeds = message.embeds.len(),
                chars = message.embeds.iter().map(Embed::size).sum::<usize>(),
                "Webhook message sent"
            );
        }
        Ok(())
    }
}

/// Plain-text rendering of groups, as printed by the dry-run notifier.
pub fn render_text(groups: &[RenderGroup], header: &str) -> String {
    let mut lines = vec![header.to_string()];
    for group in groups {
        lines.push(String::new());
        lines.push(format!("{} ({})", group.title, group.fields.len()));
        for field in &group.fields {
            lines.extend(field.name.lines().map(|l| format!("  {}", l.trim())));
            lines.extend(field.value.lines().map(|l| format!("      {}", l)));
        }
    }
    lines.join("\n")
}

/// Prints groups to stdout instead of sending them.
pub struct StdoutNotifier {
    header: String,
}

impl StdoutNotifier {
    pub fn new(header: String) -> Self {
        StdoutNotifier { header }
    }
}

impl Notifier for StdoutNotifier {
    async fn deliver(&self, groups: &[RenderGroup]) -> Result<(), DeliveryError> {
        println!("{}\n", render_text(groups, &self.header));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_watch_core::diff::DiffKind;
    use agenda_watch_core::render::Field;
    use reqwest::header::HeaderValue;

    fn field(name: &str, value: &str) -> Field {
        Field {
            name: name.to_string(),
            value: value.to_string(),
            inline: true,
        }
    }

    fn group(kind: DiffKind, count: usize) -> RenderGroup {
        RenderGroup {
            title: format!("{kind:?}"),
            kind,
            color: kind.color(),
            fields: (0..count).map(|i| field(&format!("Event {i}"), "- ⏲️ soon")).collect(),
        }
    }

    #[test]
    fn small_delta_fits_one_message() {
        let groups = vec![group(DiffKind::Added, 1), group(DiffKind::Edited, 2)];
        let messages = build_messages(&groups, "> # Changed");

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content.as_deref(), Some("> # Changed"));
        assert_eq!(messages[0].embeds.len(), 2);
        assert_eq!(messages[0].embeds[1].color, 0x0000FF);
        assert_eq!(messages[0].embeds[1].fields.len(), 2);
    }

    #[test]
    fn large_group_is_split_into_continuation_embeds() {
        let messages = build_messages(&[group(DiffKind::Added, 60)], "header");

        let embeds: Vec<_> = messages.iter().flat_map(|m| &m.embeds).collect();
        assert_eq!(embeds.len(), 3);
        assert_eq!(embeds[0].fields.len(), 25);
        assert_eq!(embeds[2].fields.len(), 10);
        assert!(embeds.iter().all(|e| e.title == "Added"));
    }

    #[test]
    fn embeds_beyond_ten_go_to_follow_up_messages() {
        let groups: Vec<_> = (0..12).map(|_| group(DiffKind::Removed, 1)).collect();
        let messages = build_messages(&groups, "header");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].embeds.len(), 10);
        assert_eq!(messages[1].embeds.len(), 2);
        assert!(messages[1].content.is_none());
    }

    fn message_size(message: &WebhookMessage) -> usize {
        message.content.as_deref().map_or(0, |c| c.chars().count())
            + message.embeds.iter().map(Embed::size).sum::<usize>()
    }

    #[test]
    fn message_size_limit_starts_new_message() {
        let long = "x".repeat(1000);
        let fields = (0..8).map(|i| field(&format!("E{i}"), &long)).collect();
        let groups = vec![
            RenderGroup {
                title: "A".into(),
                kind: DiffKind::Added,
                color: 0,
                fields,
            },
            RenderGroup {
                title: "B".into(),
                kind: DiffKind::Removed,
                color: 0,
                fields: vec![field("E", "y")],
            },
        ];

        let messages = build_messages(&groups, "h");

        // Five 1002-character fields fit next to the header; the sixth
        // continues group A in a new message, where group B still fits.
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].embeds.len(), 1);
        assert_eq!(messages[0].embeds[0].fields.len(), 5);
        let titles: Vec<_> = messages[1].embeds.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(messages[1].embeds[0].fields.len(), 3);
        assert!(messages.iter().all(|m| message_size(m) <= MAX_CHARS_PER_MESSAGE));
    }

    #[test]
    fn oversized_embed_is_split_by_characters() {
        let value = "v".repeat(400);
        let fields = (0..25).map(|i| field(&format!("Event {i}"), &value)).collect();
        let groups = vec![RenderGroup {
            title: "✅ Added".into(),
            kind: DiffKind::Added,
            color: DiffKind::Added.color(),
            fields,
        }];

        let messages = build_messages(&groups, "> # The calendar has changed!");

        assert!(messages.len() > 1);
        for message in &messages {
            assert!(
                message_size(message) <= MAX_CHARS_PER_MESSAGE,
                "message has {} chars",
                message_size(message)
            );
        }
        let embeds: Vec<_> = messages.iter().flat_map(|m| &m.embeds).collect();
        assert!(embeds.iter().all(|e| e.title == "✅ Added"));
        assert_eq!(embeds.iter().map(|e| e.fields.len()).sum::<usize>(), 25);
        assert!(messages[1..].iter().all(|m| m.content.is_none()));
    }

    #[test]
    fn largest_possible_fields_stay_within_limits() {
        let fields = (0..30)
            .map(|_| field(&"n".repeat(400), &"v".repeat(3000)))
            .collect();
        let groups = vec![RenderGroup {
            title: "🌀 Edited".into(),
            kind: DiffKind::Edited,
            color: DiffKind::Edited.color(),
            fields,
        }];

        let messages = build_messages(&groups, "header");

        assert!(messages.iter().all(|m| message_size(m) <= MAX_CHARS_PER_MESSAGE));
        assert!(messages.iter().all(|m| m.embeds.len() <= MAX_EMBEDS_PER_MESSAGE));
        let total: usize = messages
            .iter()
            .flat_map(|m| &m.embeds)
            .map(|e| e.fields.len())
            .sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn long_values_are_truncated() {
        let groups = vec![RenderGroup {
            title: "A".into(),
            kind: DiffKind::Added,
            color: 0,
            fields: vec![field(&"n".repeat(300), &"v".repeat(2000))],
        }];
        let messages = build_messages(&groups, "h");
        let f = &messages[0].embeds[0].fields[0];

        assert_eq!(f.name.chars().count(), MAX_FIELD_NAME);
        assert_eq!(f.value.chars().count(), MAX_FIELD_VALUE);
        assert!(f.value.ends_with('…'));
    }

    #[test]
    fn no_groups_means_no_messages() {
        assert!(build_messages(&[], "header").is_empty());
    }

    #[test]
    fn payload_matches_webhook_schema() {
        let messages = build_messages(&[group(DiffKind::Added, 1)], "hi");
        let json = serde_json::to_value(&messages[0]).unwrap();

        assert_eq!(json["content"], "hi");
        assert_eq!(json["embeds"][0]["color"], 0x00FF00);
        assert_eq!(json["embeds"][0]["fields"][0]["inline"], true);
    }

    #[test]
    fn retry_after_reads_fractional_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2.5"));
        assert_eq!(retry_after(&headers), Duration::from_millis(2500));
    }

    #[test]
    fn retry_after_defaults_and_caps() {
        assert_eq!(retry_after(&HeaderMap::new()), Duration::from_secs(1));

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("3600"));
        assert_eq!(retry_after(&headers), MAX_RATE_LIMIT_WAIT);
    }

    #[test]
    fn text_rendering_lists_every_field() {
        let text = render_text(&[group(DiffKind::Added, 2)], "Header");

        assert!(text.starts_with("Header\n\nAdded (2)"));
        assert!(text.contains("  Event 0"));
        assert!(text.contains("      - ⏲️ soon"));
    }
}

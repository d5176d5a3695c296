//! Cleanup applied to feed events before they enter a snapshot.

use crate::event::Event;

/// Strips feed-specific wrapper text from descriptions.
///
/// Some feeds wrap every description in a fixed preamble and footer. The
/// normalizer drops `trim_start` characters from the front and `trim_end`
/// from the back, then trims whitespace. Descriptions and locations that
/// end up empty become `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    pub trim_start: usize,
    pub trim_end: usize,
}

impl Normalizer {
    pub fn new(trim_start: usize, trim_end: usize) -> Self {
        Normalizer {
            trim_start,
            trim_end,
        }
    }

    pub fn normalize(&self, mut event: Event) -> Event {
        event.description = event
            .description
            .as_deref()
            .map(|d| self.strip_wrapper(d))
            .and_then(non_empty);
        event.location = event.location.as_deref().and_then(non_empty);
        event.summary = event.summary.trim().to_string();
        event
    }

    fn strip_wrapper(&self, text: &str) -> String {
        let len = text.chars().count();
        let keep = len.saturating_sub(self.trim_start + self.trim_end);
        text.chars().skip(self.trim_start).take(keep).collect()
    }
}

fn non_empty(text: impl AsRef<str>) -> Option<String> {
    let trimmed = text.as_ref().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

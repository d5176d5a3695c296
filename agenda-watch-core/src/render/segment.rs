use std::fmt;

/// A piece of rendered text that either stayed the same or changed.
///
/// Segments are assembled from a diff first and turned into Markdown last,
/// so deciding what changed and deciding how it looks stay separate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Changed { before: String, after: String },
}

impl Segment {
    /// `Changed` when `changed` is set, otherwise the current (`after`) value.
    pub fn pick(changed: bool, before: impl Into<String>, after: impl Into<String>) -> Segment {
        if changed {
            Segment::Changed {
                before: before.into(),
                after: after.into(),
            }
        } else {
            Segment::Plain(after.into())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Segment::Plain(text) => text.is_empty(),
            Segment::Changed { before, after } => before.is_empty() && after.is_empty(),
        }
    }
}

/// `~~before~~ **after**`; an empty side is left out.
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Plain(text) => write!(f, "{}", text),
            Segment::Changed { before, after } => match (before.is_empty(), after.is_empty()) {
                (false, false) => write!(f, "~~{}~~ **{}**", before, after),
                (false, true) => write!(f, "~~{}~~", before),
                (true, false) => write!(f, "**{}**", after),
                (true, true) => Ok(()),
            },
        }
    }
}

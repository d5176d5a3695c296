use std::fmt;

use serde::{Deserialize, Serialize};

/// The category a changed event falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Added,
    Removed,
    Edited,
}

impl DiffKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            DiffKind::Added => "+",
            DiffKind::Removed => "-",
            DiffKind::Edited => "~",
        }
    }

    /// Embed color for this category (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            DiffKind::Added => 0x00FF00,
            DiffKind::Removed => 0xFF0000,
            DiffKind::Edited => 0x0000FF,
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

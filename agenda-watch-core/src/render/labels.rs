use serde::{Deserialize, Serialize};

use crate::diff::DiffKind;

/// Language of the fixed notification texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

/// Fixed texts used around rendered events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub added: String,
    pub removed: String,
    pub edited: String,
    /// Message content sent alongside the groups
    pub header: String,
    /// Shown instead of an absent description
    pub no_information: String,
}

impl Labels {
    pub fn english() -> Self {
        Labels {
            added: "✅ Added".into(),
            removed: "❌ Removed".into(),
            edited: "🌀 Edited".into(),
            header: "> # The calendar has changed!".into(),
            no_information: "*No additional information*".into(),
        }
    }

    pub fn french() -> Self {
        Labels {
            added: "✅ Ajouts".into(),
            removed: "❌ Suppressions".into(),
            edited: "🌀 Modifications".into(),
            header: "> # L'agenda a été modifié !".into(),
            no_information: "*Aucune information complémentaire*".into(),
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::En => Self::english(),
            Language::Fr => Self::french(),
        }
    }

    pub fn title(&self, kind: DiffKind) -> &str {
        match kind {
            DiffKind::Added => &self.added,
            DiffKind::Removed => &self.removed,
            DiffKind::Edited => &self.edited,
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

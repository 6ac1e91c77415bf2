//! Display transcript for a node's conversation.
//!
//! The transcript is a superset of the model-visible history: user and
//! assistant turns appear in both, while error lines exist only here. Each
//! entry is timestamped at append time and renders in the `[role]: text`
//! form the conversation panes display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of line a transcript entry is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    User,
    Assistant,
    Error,
}

impl TranscriptKind {
    fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Error => "error",
        }
    }
}

/// A single display line in a node's transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// When the line was appended.
    pub when: DateTime<Utc>,
    /// Line kind; error lines never enter the model-visible history.
    pub kind: TranscriptKind,
    /// The line text.
    pub text: String,
}

impl TranscriptEntry {
    fn new(kind: TranscriptKind, text: impl Into<String>) -> Self {
        Self {
            when: Utc::now(),
            kind,
            text: text.into(),
        }
    }

    /// A user input line.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TranscriptKind::User, text)
    }

    /// An assistant reply line.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TranscriptKind::Assistant, text)
    }

    /// An inline error line.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(TranscriptKind::Error, text)
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.kind.label(), self.text)
    }
}

/// Renders transcript entries as one newline-separated block.
#[must_use]
pub fn render(entries: &[TranscriptEntry]) -> String {
    let mut out = String::new();
    for (idx, entry) in entries.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&entry.to_string());
    }
    out
}

//! Segmented script units.

use serde::{Deserialize, Serialize};

/// One atomic piece of a segmented meditation script.
///
/// Units are produced in left-to-right script order by the segmenter and that
/// order is replayed verbatim through synthesis and assembly. A unit is either
/// a chunk of speakable text or a timed pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptUnit {
    /// Speakable text, already whitespace-normalized and non-empty.
    Speech { text: String },
    /// A pause of the given whole-second duration (always positive).
    Silence { seconds: u32 },
}

impl ScriptUnit {
    /// Create a speech unit.
    pub fn speech(text: impl Into<String>) -> Self {
        Self::Speech { text: text.into() }
    }

    /// Create a silence unit.
    pub fn silence(seconds: u32) -> Self {
        Self::Silence { seconds }
    }

    /// Whether this unit carries speakable text.
    pub fn is_speech(&self) -> bool {
        matches!(self, ScriptUnit::Speech { .. })
    }

    /// Speech text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            ScriptUnit::Speech { text } => Some(text),
            ScriptUnit::Silence { .. } => None,
        }
    }

    /// Pause duration in seconds, if any.
    pub fn pause_seconds(&self) -> Option<u32> {
        match self {
            ScriptUnit::Speech { .. } => None,
            ScriptUnit::Silence { seconds } => Some(*seconds),
        }
    }
}

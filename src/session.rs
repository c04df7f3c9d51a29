use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};

/// A timestamped note captured while a session is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Elapsed seconds at the moment the note was taken
    #[serde(rename = "time")]
    pub offset_seconds: u32,
    #[serde(rename = "note")]
    pub text: String,
}

impl Annotation {
    pub fn new(offset_seconds: u32, text: impl Into<String>) -> Self {
        Self {
            offset_seconds,
            text: text.into(),
        }
    }
}

/// A completed session as written to the journal.
///
/// Field names on disk follow the `focusSessions` layout
/// (`startedAt`, `endedAt`, `duration`, `note`, `logs`). Older blobs that
/// used `startTime`/`endTime` are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Empty until the store assigns one
    #[serde(default)]
    pub id: String,
    #[serde(alias = "startTime")]
    pub started_at: DateTime<FixedOffset>,
    #[serde(alias = "endTime")]
    pub ended_at: DateTime<FixedOffset>,
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    #[serde(default)]
    pub note: String,
    #[serde(rename = "logs", default)]
    pub annotations: Vec<Annotation>,
}

impl StoredSession {
    /// Build an unsaved record. `ended_at` is clamped so it never precedes
    /// `started_at`, even if the wall clock stepped backwards mid-session.
    pub fn new(
        started_at: DateTime<Local>,
        ended_at: DateTime<Local>,
        duration_seconds: u32,
        note: &str,
        annotations: Vec<Annotation>,
    ) -> Self {
        let ended_at = ended_at.max(started_at);
        Self {
            id: String::new(),
            started_at: started_at.into(),
            ended_at: ended_at.into(),
            duration_seconds,
            note: note.trim().to_string(),
            annotations,
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

use archsmith_utils::text::collapse_whitespace;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message of the requirement-gathering dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    /// 0-based position in the transcript
    pub turn_index: usize,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationTurn {
    #[must_use]
    pub fn new(role: TurnRole, text: impl Into<String>, turn_index: usize) -> Self {
        Self {
            role,
            text: text.into(),
            turn_index,
            recorded_at: Utc::now(),
        }
    }
}

/// Render turns as `User: …` / `Assistant: …` lines, one line per turn.
#[must_use]
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, collapse_whitespace(&turn.text)))
        .collect::<Vec<_>>()
        .join("\n")
}

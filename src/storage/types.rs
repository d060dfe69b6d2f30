use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One named conversation thread
///
/// The session index persists a list of these as a single JSON blob;
/// the messages live under a separate per-session key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier for the session
    pub id: String,
    /// User-facing display name
    pub name: String,
    /// When the session was created or last renamed
    pub timestamp: DateTime<Utc>,
}

/// Author of a stored chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A single message in a session's ordered history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier for the message
    pub id: String,
    /// Who wrote the message
    pub role: Role,
    /// Message body
    pub content: String,
    /// When the message was created or last edited
    pub timestamp: DateTime<Utc>,
}

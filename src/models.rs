use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "assistant" => Sender::Assistant,
            _ => Sender::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

fn default_user_id() -> String {
    "anonymous".to_string()
}

/// Canonical song attributes. Empty strings stand for "unknown".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub release_date: String,
    pub album_image_url: String,
    pub external_url: String,
}

impl SongMetadata {
    pub fn from_query(query: &str) -> Self {
        Self {
            title: query.to_string(),
            ..Self::default()
        }
    }
}

/// Scraped lyrics plus the lyrics-index hit they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLyrics {
    pub text: String,
    pub source_url: String,
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LyricsDocument {
    pub html: String,
    pub metadata: SongMetadata,
}

use thiserror::Error;

use crate::config::AppConfig;
use crate::db::Database;
use crate::gemini::GeminiClient;
use crate::lyrics::LyricsPipeline;
use crate::models::{ChatReply, ChatRequest, HistoryTurn, Sender};
use crate::transcript::SubtitleFetcher;

const SESSION_TITLE_CHARS: usize = 40;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// What a user message asks for, decided by its command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Summarize(String),
    Lyrics(String),
    Chat,
}

impl Intent {
    pub fn parse(message: &str) -> Self {
        let lowered = message.to_lowercase();
        let argument = || {
            message
                .split_once(':')
                .map(|(_, rest)| rest.trim().to_string())
                .unwrap_or_default()
        };

        if lowered.starts_with("summarize:") {
            Intent::Summarize(argument())
        } else if lowered.starts_with("lyrics:") {
            Intent::Lyrics(argument())
        } else {
            Intent::Chat
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    db: Database,
    gemini: GeminiClient,
    lyrics: LyricsPipeline,
    subtitles: SubtitleFetcher,
    genius_token: String,
    subtitle_lang: String,
}

impl ChatService {
    pub fn new(
        config: &AppConfig,
        db: Database,
        gemini: GeminiClient,
        lyrics: LyricsPipeline,
        subtitles: SubtitleFetcher,
    ) -> Self {
        Self {
            db,
            gemini,
            lyrics,
            subtitles,
            genius_token: config.lyrics.genius_token.clone().unwrap_or_default(),
            subtitle_lang: config.transcript.subtitle_lang.clone(),
        }
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session_id = match request.session_id {
            Some(id) => {
                if !self.db.session_exists(id).await? {
                    return Err(ChatError::SessionNotFound);
                }
                id
            }
            None => {
                let title: String = message.chars().take(SESSION_TITLE_CHARS).collect();
                self.db.create_session(&title).await?.id
            }
        };

        tracing::info!(session_id, user_id = %request.user_id, "handling chat message");
        let reply = self.respond(message, &request.history).await;

        self.db.save_message(session_id, Sender::User, message).await?;
        self.db
            .save_message(session_id, Sender::Assistant, &reply)
            .await?;

        Ok(ChatReply { reply, session_id })
    }

    async fn respond(&self, message: &str, history: &[HistoryTurn]) -> String {
        match Intent::parse(message) {
            Intent::Summarize(url) => {
                match self.subtitles.fetch_transcript(&url, &self.subtitle_lang).await {
                    Ok(transcript) => self.gemini.summarize(&transcript).await,
                    Err(err) => format!("Error: {err}"),
                }
            }
            Intent::Lyrics(query) => {
                match self.lyrics.lyrics_and_details(&query, &self.genius_token).await {
                    Ok(document) => document.html,
                    Err(err) => format!("Error: {err}"),
                }
            }
            Intent::Chat => self.gemini.chat(&build_prompt(history, message)).await,
        }
    }
}

/// Renders prior turns as a transcript ending in an open assistant turn.
pub fn build_prompt(history: &[HistoryTurn], message: &str) -> String {
    if history.is_empty() {
        return message.to_string();
    }

    let mut prompt = String::new();
    for turn in history {
        match turn.role.as_str() {
            "user" => prompt.push_str(&format!("User: {}\n", turn.content)),
            "assistant" => prompt.push_str(&format!("Assistant: {}\n", turn.content)),
            _ => {}
        }
    }
    prompt.push_str(&format!("User: {message}\nAssistant:"));
    prompt
}

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use songbot::chat::ChatService;
use songbot::config::{AppConfig, GeminiConfig, LyricsConfig, TranscriptConfig};
use songbot::db::Database;
use songbot::gemini::GeminiClient;
use songbot::lyrics::LyricsPipeline;
use songbot::transcript::SubtitleFetcher;

pub const GENIUS_TOKEN: &str = "genius-token";
pub const GEMINI_MODEL: &str = "test-model";

pub fn test_config(gemini_url: &str, genius_url: &str) -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: PathBuf::from("./target/test-data"),
        http_timeout: Duration::from_secs(5),
        gemini: GeminiConfig {
            api_key: Some("gemini-key".to_string()),
            base_url: gemini_url.to_string(),
            model: GEMINI_MODEL.to_string(),
        },
        lyrics: LyricsConfig {
            genius_token: Some(GENIUS_TOKEN.to_string()),
            genius_api_url: genius_url.to_string(),
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_accounts_url: "http://127.0.0.1:9".to_string(),
            spotify_api_url: "http://127.0.0.1:9".to_string(),
        },
        transcript: TranscriptConfig {
            yt_dlp_bin: "definitely-not-installed-yt-dlp".to_string(),
            subtitle_lang: "en".to_string(),
        },
    }
}

pub async fn chat_service(config: &AppConfig) -> (Database, ChatService) {
    let http = config.http_client().unwrap();
    let db = Database::in_memory().await.unwrap();
    let chat = ChatService::new(
        config,
        db.clone(),
        GeminiClient::new(http.clone(), &config.gemini),
        LyricsPipeline::from_config(http, &config.lyrics),
        SubtitleFetcher::new(&config.transcript),
    );
    (db, chat)
}

pub fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ], "role": "model" } }
        ]
    })
}

pub fn gemini_path() -> String {
    format!("/models/{GEMINI_MODEL}:generateContent")
}

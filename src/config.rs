use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct LyricsConfig {
    pub genius_token: Option<String>,
    pub genius_api_url: String,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_accounts_url: String,
    pub spotify_api_url: String,
}

#[derive(Clone, Debug)]
pub struct TranscriptConfig {
    pub yt_dlp_bin: String,
    pub subtitle_lang: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub gemini: GeminiConfig,
    pub lyrics: LyricsConfig,
    pub transcript: TranscriptConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let data_dir = env::var("SONGBOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        Self {
            bind_addr: env::var("SONGBOT_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            data_dir,
            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
            gemini: GeminiConfig {
                api_key: non_empty_var("GEMINI_API_KEY"),
                base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1".to_string()
                }),
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            },
            lyrics: LyricsConfig {
                genius_token: non_empty_var("GENIUS_TOKEN"),
                genius_api_url: env::var("GENIUS_API_URL")
                    .unwrap_or_else(|_| "https://api.genius.com".to_string()),
                spotify_client_id: non_empty_var("SPOTIFY_CLIENT_ID"),
                spotify_client_secret: non_empty_var("SPOTIFY_CLIENT_SECRET"),
                spotify_accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                    .unwrap_or_else(|_| "https://accounts.spotify.com".to_string()),
                spotify_api_url: env::var("SPOTIFY_API_URL")
                    .unwrap_or_else(|_| "https://api.spotify.com/v1".to_string()),
            },
            transcript: TranscriptConfig {
                yt_dlp_bin: env::var("YT_DLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
                subtitle_lang: env::var("SUBTITLE_LANG").unwrap_or_else(|_| "en".to_string()),
            },
        }
    }

    pub fn sqlite_dsn(&self) -> String {
        format!("sqlite://{}", self.data_dir.join("songbot.sqlite3").display())
    }

    /// Shared outbound client; every external-service wrapper clones this one.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.http_timeout)
            .user_agent(concat!("songbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use songbot::chat::ChatService;
use songbot::db::Database;
use songbot::gemini::GeminiClient;
use songbot::lyrics::LyricsPipeline;
use songbot::transcript::SubtitleFetcher;
use songbot::{run_server, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let http = config.http_client()?;

    let db = Database::new(&config).await?;
    let gemini = GeminiClient::new(http.clone(), &config.gemini);
    let lyrics = LyricsPipeline::from_config(http, &config.lyrics);
    let subtitles = SubtitleFetcher::new(&config.transcript);

    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; chat replies will fall back to an apology");
    }
    if config.lyrics.genius_token.is_none() {
        tracing::warn!("GENIUS_TOKEN is not set; lyrics lookups will fail");
    }

    let chat = ChatService::new(&config, db.clone(), gemini, lyrics, subtitles);

    run_server(config, db, chat).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use songbot::config::AppConfig;
use songbot::lyrics::genius::GeniusFetcher;
use songbot::lyrics::{LyricsCleaner, LyricsPipeline};

#[derive(Parser, Debug)]
#[command(name = "lyrics")]
#[command(about = "Look up, clean and format lyrics for a song")]
struct Cli {
    /// Song title, optionally with the artist
    #[arg(long)]
    query: String,
    /// Print the cleaned plain text instead of the formatted document
    #[arg(long, default_value_t = false)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let http = config.http_client()?;
    let token = config.lyrics.genius_token.clone().unwrap_or_default();

    if cli.raw {
        let fetcher = GeniusFetcher::new(http, config.lyrics.genius_api_url.clone());
        match fetcher.fetch_raw_lyrics(&cli.query, &token).await {
            Ok(raw) => {
                println!("{} - {} ({})", raw.artist, raw.title, raw.source_url);
                println!();
                println!("{}", LyricsCleaner::default().clean(&raw.text));
            }
            Err(err) => println!("Error: {err}"),
        }
        return Ok(());
    }

    let pipeline = LyricsPipeline::from_config(http, &config.lyrics);
    match pipeline.lyrics_and_details(&cli.query, &token).await {
        Ok(document) => println!("{}", document.html),
        Err(err) => println!("Error: {err}"),
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

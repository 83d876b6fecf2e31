pub mod genius;
pub mod normalize;
pub mod spotify;

use thiserror::Error;

use crate::config::LyricsConfig;
use crate::models::{LyricsDocument, SongMetadata};

pub use genius::GeniusFetcher;
pub use normalize::{format_sections, LyricsCleaner};
pub use spotify::{MetadataLookup, SpotifyCredentials, SpotifyResolver};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LyricsError {
    #[error("Song not found.")]
    SongNotFound,
}

/// Metadata lookup, lyric scraping and cleanup composed into one call.
#[derive(Clone)]
pub struct LyricsPipeline {
    metadata: SpotifyResolver,
    source: GeniusFetcher,
    cleaner: LyricsCleaner,
}

impl LyricsPipeline {
    pub fn new(metadata: SpotifyResolver, source: GeniusFetcher, cleaner: LyricsCleaner) -> Self {
        Self {
            metadata,
            source,
            cleaner,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &LyricsConfig) -> Self {
        let credentials = SpotifyCredentials::from_parts(
            config.spotify_client_id.clone(),
            config.spotify_client_secret.clone(),
        );
        Self::new(
            SpotifyResolver::new(
                client.clone(),
                config.spotify_accounts_url.clone(),
                config.spotify_api_url.clone(),
                credentials,
            ),
            GeniusFetcher::new(client, config.genius_api_url.clone()),
            LyricsCleaner::default(),
        )
    }

    pub async fn lyrics_and_details(
        &self,
        query: &str,
        token: &str,
    ) -> Result<LyricsDocument, LyricsError> {
        let (lookup, fetched) = tokio::join!(
            self.metadata.resolve(query),
            self.source.fetch_raw_lyrics(query, token)
        );

        let mut metadata = match lookup {
            MetadataLookup::Found(metadata) => metadata,
            MetadataLookup::Unavailable(gap) => {
                tracing::debug!(?gap, "song metadata unavailable, using query");
                SongMetadata::from_query(query)
            }
        };
        let raw = fetched?;

        if metadata.title.is_empty() {
            metadata.title = raw.title.clone();
        }
        if metadata.artist.is_empty() {
            metadata.artist = raw.artist.clone();
        }

        let cleaned = self.cleaner.clean(&raw.text);
        let formatted = format_sections(&cleaned);
        tracing::info!(
            title = %metadata.title,
            source = %raw.source_url,
            "lyrics assembled"
        );

        Ok(LyricsDocument {
            html: render_document(&metadata, &formatted),
            metadata,
        })
    }
}

pub fn render_document(metadata: &SongMetadata, formatted: &str) -> String {
    format!(
        "\n<b style=\"font-size:1.5em;\">{title}</b><br>\n\
         <br>\n\
         Song Artist: {artist}<br>\n\
         Album/Movie: {album}<br>\n\
         Genre: {genre}<br>\n\
         Release Date: {release_date}<br>\n\
         <br>\n\
         {formatted}\n",
        title = metadata.title,
        artist = metadata.artist,
        album = metadata.album,
        genre = metadata.genre,
        release_date = metadata.release_date,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_header_lists_metadata_before_lyrics() {
        let metadata = SongMetadata {
            title: "Imagine".to_string(),
            artist: "John Lennon".to_string(),
            album: "Imagine".to_string(),
            genre: "rock, soft rock".to_string(),
            release_date: "1971-09-09".to_string(),
            ..SongMetadata::default()
        };
        let html = render_document(&metadata, "<br>[Chorus]<br>");

        assert!(html.contains("<b style=\"font-size:1.5em;\">Imagine</b><br>\n<br>\n"));
        assert!(html.contains("Song Artist: John Lennon<br>\n"));
        assert!(html.contains("Genre: rock, soft rock<br>\n"));
        assert!(html.contains("Release Date: 1971-09-09<br>\n<br>\n<br>[Chorus]<br>\n"));
        let artist_at = html.find("Song Artist").unwrap();
        let body_at = html.find("[Chorus]").unwrap();
        assert!(artist_at < body_at);
    }

    #[test]
    fn error_reason_is_user_facing() {
        assert_eq!(LyricsError::SongNotFound.to_string(), "Song not found.");
    }
}

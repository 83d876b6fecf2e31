use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::models::SongMetadata;

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SpotifyCredentials {
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        Some(Self {
            client_id: client_id?,
            client_secret: client_secret?,
        })
    }
}

/// Outcome of a metadata lookup. `Unavailable` is a soft miss, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataLookup {
    Found(SongMetadata),
    Unavailable(MetadataGap),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataGap {
    MissingCredentials,
    NoMatch,
    RequestFailed(String),
}

impl MetadataLookup {
    pub fn into_option(self) -> Option<SongMetadata> {
        match self {
            MetadataLookup::Found(metadata) => Some(metadata),
            MetadataLookup::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResp {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResp {
    #[serde(default)]
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    album: Album,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct Album {
    name: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistResp {
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Clone)]
pub struct SpotifyResolver {
    client: Client,
    accounts_url: String,
    api_url: String,
    credentials: Option<SpotifyCredentials>,
}

impl SpotifyResolver {
    pub fn new(
        client: Client,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
        credentials: Option<SpotifyCredentials>,
    ) -> Self {
        Self {
            client,
            accounts_url: accounts_url.into(),
            api_url: api_url.into(),
            credentials,
        }
    }

    pub async fn resolve(&self, query: &str) -> MetadataLookup {
        let Some(credentials) = &self.credentials else {
            return MetadataLookup::Unavailable(MetadataGap::MissingCredentials);
        };

        match self.lookup(credentials, query).await {
            Ok(Some(metadata)) => MetadataLookup::Found(metadata),
            Ok(None) => MetadataLookup::Unavailable(MetadataGap::NoMatch),
            Err(err) => {
                tracing::warn!("metadata lookup for {:?} failed: {:#}", query, err);
                MetadataLookup::Unavailable(MetadataGap::RequestFailed(format!("{err:#}")))
            }
        }
    }

    async fn lookup(
        &self,
        credentials: &SpotifyCredentials,
        query: &str,
    ) -> Result<Option<SongMetadata>> {
        let token = self.access_token(credentials).await?;

        let Some(track) = self.search_track(&token, query).await? else {
            return Ok(None);
        };
        let Some(artist) = track.artists.first() else {
            return Ok(None);
        };

        let genres = self.artist_genres(&token, &artist.id).await?;

        Ok(Some(SongMetadata {
            title: String::new(),
            artist: artist.name.clone(),
            album: track.album.name.clone(),
            genre: genres.join(", "),
            release_date: track.album.release_date.clone().unwrap_or_default(),
            album_image_url: track
                .album
                .images
                .first()
                .map(|image| image.url.clone())
                .unwrap_or_default(),
            external_url: track.external_urls.spotify.clone().unwrap_or_default(),
        }))
    }

    async fn access_token(&self, credentials: &SpotifyCredentials) -> Result<String> {
        let url = format!("{}/api/token", self.accounts_url);
        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("failed to call metadata token endpoint")?
            .error_for_status()
            .context("metadata token endpoint returned non-success status")?
            .json::<TokenResp>()
            .await
            .context("failed to decode metadata token response")?;

        response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow::anyhow!("metadata token response had no access_token"))
    }

    async fn search_track(&self, token: &str, query: &str) -> Result<Option<Track>> {
        let url = format!("{}/search", self.api_url);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .context("failed to call track search endpoint")?
            .error_for_status()
            .context("track search returned non-success status")?
            .json::<SearchResp>()
            .await
            .context("failed to decode track search response")?;

        Ok(response
            .tracks
            .and_then(|page| page.items.into_iter().next()))
    }

    async fn artist_genres(&self, token: &str, artist_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/artists/{}", self.api_url, artist_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("failed to call artist endpoint")?
            .error_for_status()
            .context("artist endpoint returned non-success status")?
            .json::<ArtistResp>()
            .await
            .context("failed to decode artist response")?;

        Ok(response.genres)
    }
}

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;

use super::LyricsError;
use crate::models::RawLyrics;

pub const LYRICS_PLACEHOLDER: &str = "Lyrics not found.";

const CONTAINER_SELECTOR: &str = r#"div[data-lyrics-container="true"]"#;
const LEGACY_SELECTOR: &str = "div.lyrics";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: HitResult,
}

#[derive(Debug, Deserialize)]
struct HitResult {
    title: String,
    url: String,
    primary_artist: HitArtist,
}

#[derive(Debug, Deserialize)]
struct HitArtist {
    name: String,
}

/// Lyrics-index search plus lyric page scraping.
#[derive(Clone)]
pub struct GeniusFetcher {
    client: Client,
    api_url: String,
}

impl GeniusFetcher {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    pub async fn fetch_raw_lyrics(&self, query: &str, token: &str) -> Result<RawLyrics, LyricsError> {
        let hit = match self.search(query, token).await {
            Ok(Some(hit)) => hit,
            Ok(None) => return Err(LyricsError::SongNotFound),
            Err(err) => {
                tracing::warn!("lyrics search for {:?} failed: {:#}", query, err);
                return Err(LyricsError::SongNotFound);
            }
        };

        let text = match self.fetch_page(&hit.url).await {
            Ok(html) => extract_lyrics(&html),
            Err(err) => {
                tracing::warn!("lyrics page {} unavailable: {:#}", hit.url, err);
                LYRICS_PLACEHOLDER.to_string()
            }
        };

        Ok(RawLyrics {
            text,
            source_url: hit.url,
            title: hit.title,
            artist: hit.primary_artist.name,
        })
    }

    async fn search(&self, query: &str, token: &str) -> Result<Option<HitResult>> {
        let url = format!("{}/search", self.api_url);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("q", query)])
            .send()
            .await
            .context("failed to call lyrics search endpoint")?
            .error_for_status()
            .context("lyrics search returned non-success status")?
            .json::<SearchResponse>()
            .await
            .context("failed to decode lyrics search response")?;

        Ok(response.response.hits.into_iter().next().map(|hit| hit.result))
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .await
            .context("failed to fetch lyrics page")?
            .error_for_status()
            .context("lyrics page returned non-success status")?
            .text()
            .await
            .context("failed to read lyrics page body")
    }
}

/// Pulls lyric text out of a lyrics page, preferring the current container
/// markup over the legacy one.
pub fn extract_lyrics(html: &str) -> String {
    let document = Html::parse_document(html);

    let containers = select_text(&document, CONTAINER_SELECTOR);
    if !containers.is_empty() {
        return containers.join("\n");
    }

    select_text(&document, LEGACY_SELECTOR)
        .into_iter()
        .next()
        .unwrap_or_else(|| LYRICS_PLACEHOLDER.to_string())
}

fn select_text(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return vec![];
    };
    document.select(&selector).map(element_text).collect()
}

const BLOCK_ELEMENTS: &[&str] = &["div", "p", "li", "section", "h1", "h2", "h3"];

// Block elements and <br> end a line; inline markup such as annotation links
// stays on the line it wraps.
fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if el.name() == "br" {
                    out.push('\n');
                } else if BLOCK_ELEMENTS.contains(&el.name()) {
                    out.push('\n');
                    push_text(child, out);
                    out.push('\n');
                } else {
                    push_text(child, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_every_lyrics_container() {
        let html = r#"
            <html><body>
              <div data-lyrics-container="true">[Verse 1]<br>Imagine there's no <a href="/x"><span>heaven</span></a></div>
              <div class="ad">Buy tickets</div>
              <div data-lyrics-container="true">[Chorus]<br/>Imagine all the people</div>
            </body></html>
        "#;
        assert_eq!(
            extract_lyrics(html),
            "[Verse 1]\nImagine there's no heaven\n[Chorus]\nImagine all the people"
        );
    }

    #[test]
    fn falls_back_to_legacy_container() {
        let html = r#"<div class="lyrics"><p>Line one<br>Line two</p></div>"#;
        assert_eq!(extract_lyrics(html), "Line one\nLine two");
    }

    #[test]
    fn header_block_inside_container_gets_its_own_lines() {
        let html = r#"<div data-lyrics-container="true"><div data-exclude-from-selection="true"><div><span>151 Contributors</span></div><div>Translations</div><div>Imagine Lyrics</div></div>[Verse 1]<br/>Imagine there's no heaven<br/>It's easy if you try</div>"#;
        let raw = extract_lyrics(html);
        assert_eq!(
            raw,
            "151 Contributors\nTranslations\nImagine Lyrics\n[Verse 1]\nImagine there's no heaven\nIt's easy if you try"
        );
        assert_eq!(
            crate::lyrics::LyricsCleaner::default().clean(&raw),
            "[Verse 1]\nImagine there's no heaven\nIt's easy if you try"
        );
    }

    #[test]
    fn legacy_paragraphs_are_separate_lines() {
        let html = r#"<div class="lyrics"><p>First line of the song here</p><p>Second line of the song here</p></div>"#;
        assert_eq!(
            extract_lyrics(html),
            "First line of the song here\nSecond line of the song here"
        );
    }

    #[test]
    fn placeholder_when_no_markup_matches() {
        assert_eq!(extract_lyrics("<html><p>nothing</p></html>"), LYRICS_PLACEHOLDER);
    }
}

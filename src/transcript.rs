//! Subtitle transcripts for YouTube videos via the `yt-dlp` binary.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tokio::process::Command;

use crate::config::TranscriptConfig;

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());
static INLINE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("Invalid YouTube URL.")]
    InvalidUrl,
    #[error("No subtitles found for this language.")]
    NoSubtitles,
    #[error("Transcript is empty.")]
    Empty,
    #[error("Subtitle fetch error: {0}")]
    Fetch(String),
}

pub fn youtube_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Clone)]
pub struct SubtitleFetcher {
    yt_dlp_bin: String,
}

impl SubtitleFetcher {
    pub fn new(config: &TranscriptConfig) -> Self {
        Self {
            yt_dlp_bin: config.yt_dlp_bin.clone(),
        }
    }

    pub async fn fetch_transcript(&self, url: &str, lang: &str) -> Result<String, TranscriptError> {
        let video_id = youtube_video_id(url).ok_or(TranscriptError::InvalidUrl)?;

        let scratch = tempfile::tempdir().map_err(|e| TranscriptError::Fetch(e.to_string()))?;
        let template = scratch.path().join("%(id)s.%(ext)s");

        let output = Command::new(&self.yt_dlp_bin)
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(lang)
            .arg("--sub-format")
            .arg("vtt")
            .arg("--skip-download")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("-o")
            .arg(&template)
            .arg(url)
            .output()
            .await
            .map_err(|e| TranscriptError::Fetch(format!("failed to run {}: {e}", self.yt_dlp_bin)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Fetch(stderr.trim().to_string()));
        }

        let vtt_path = find_subtitle_file(scratch.path(), &video_id)
            .await
            .ok_or(TranscriptError::NoSubtitles)?;
        let raw = tokio::fs::read_to_string(&vtt_path)
            .await
            .map_err(|e| TranscriptError::Fetch(e.to_string()))?;

        let transcript = clean_vtt(&raw);
        if transcript.trim().is_empty() {
            return Err(TranscriptError::Empty);
        }
        tracing::info!(video_id = %video_id, lines = transcript.lines().count(), "subtitle transcript ready");
        Ok(transcript)
    }
}

async fn find_subtitle_file(dir: &Path, video_id: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(video_id) && name.ends_with(".vtt") {
            return Some(entry.path());
        }
    }
    None
}

/// Flattens a WebVTT file to caption text, one line per caption line.
pub fn clean_vtt(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.contains("-->")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
        {
            continue;
        }
        let text = INLINE_TAG_RE.replace_all(line, "");
        if text.is_empty() {
            continue;
        }
        // Auto captions repeat the previous cue's line as a roll-up.
        if lines.last().map(String::as_str) == Some(&*text) {
            continue;
        }
        lines.push(text.into_owned());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_video_id_from_common_urls() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_video_id("not a link"), None);
    }

    #[test]
    fn vtt_is_flattened_and_deduplicated() {
        let raw = "WEBVTT\nKind: captions\nLanguage: en\n\n00:00:00.000 --> 00:00:02.000\nhello <c>there</c>\n\n00:00:02.000 --> 00:00:04.000\nhello there\ngeneral <00:00:03.100><c>kenobi</c>\n";
        assert_eq!(clean_vtt(raw), "hello there\ngeneral kenobi");
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_spawning() {
        let fetcher = SubtitleFetcher::new(&TranscriptConfig {
            yt_dlp_bin: "definitely-not-installed-yt-dlp".to_string(),
            subtitle_lang: "en".to_string(),
        });
        let err = fetcher.fetch_transcript("hello", "en").await.unwrap_err();
        assert_eq!(err, TranscriptError::InvalidUrl);
        assert_eq!(err.to_string(), "Invalid YouTube URL.");
    }

    #[tokio::test]
    async fn missing_binary_is_a_fetch_error() {
        let fetcher = SubtitleFetcher::new(&TranscriptConfig {
            yt_dlp_bin: "definitely-not-installed-yt-dlp".to_string(),
            subtitle_lang: "en".to_string(),
        });
        let err = fetcher
            .fetch_transcript("https://youtu.be/dQw4w9WgXcQ", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::Fetch(_)));
        assert!(err.to_string().starts_with("Subtitle fetch error:"));
    }
}

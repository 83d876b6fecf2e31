//! Line-level cleanup of scraped lyrics.
//!
//! Scraped pages interleave the actual lyric lines with contributor counts,
//! translation pickers, credits and dividers. [`LyricsCleaner`] drops those
//! through an ordered rule table while leaving `[Section]` headers intact,
//! and [`format_sections`] turns the result into a `<br>`-delimited fragment.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const LINE_BREAK: &str = "<br>";

/// Lowercase substrings that mark credit/metadata noise.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "contributors",
    "translations",
    "read more",
    "lyrics",
    "released",
    "see",
    "embed",
    "copyright",
    "you might also like",
    "about",
    "album",
    "tracklist",
    "credits",
    "produced by",
    "written by",
    "composed by",
    "mix",
    "master",
    "engineer",
    "label",
    "publisher",
    "recorded",
    "release date",
    "view all",
    "expand",
    "genius",
    "remix",
    "feat.",
    "featuring",
];

pub const DEFAULT_MAX_NOISE_TOKENS: usize = 3;

static SECTION_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*\]$").unwrap());
static SECTION_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\[\]]+\]").unwrap());
static TEXTUAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}\p{N}\p{P}\p{S}\s]+$").unwrap());
static NUMBER_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static DIVIDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-–—\s]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Keyword,
    NumberOnly,
    Divider,
    LanguageName,
    ShortFragment,
}

/// A trimmed, non-empty input line with its matching key precomputed.
pub struct Line<'a> {
    pub text: &'a str,
    pub folded: String,
    pub tokens: usize,
    pub is_header: bool,
}

impl<'a> Line<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            folded: fold(text),
            tokens: text.split_whitespace().count(),
            is_header: is_section_header(text),
        }
    }
}

pub type Predicate = fn(&LyricsCleaner, &Line<'_>) -> bool;

#[derive(Clone)]
pub struct LyricsCleaner {
    keywords: Vec<String>,
    max_noise_tokens: usize,
    rules: Vec<(DropReason, Predicate)>,
}

impl Default for LyricsCleaner {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()),
            DEFAULT_MAX_NOISE_TOKENS,
        )
    }
}

impl LyricsCleaner {
    pub fn new(keywords: impl IntoIterator<Item = String>, max_noise_tokens: usize) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| fold(&k)).collect(),
            max_noise_tokens,
            rules: vec![
                (DropReason::Keyword, has_keyword as Predicate),
                (DropReason::NumberOnly, is_number_only as Predicate),
                (DropReason::Divider, is_divider as Predicate),
                (DropReason::LanguageName, is_language_name as Predicate),
                (DropReason::ShortFragment, is_short_fragment as Predicate),
            ],
        }
    }

    /// Appends a rule evaluated after the built-in ones.
    pub fn with_rule(mut self, reason: DropReason, predicate: Predicate) -> Self {
        self.rules.push((reason, predicate));
        self
    }

    /// Why `line` would be dropped, or `None` if it is kept.
    pub fn classify(&self, line: &str) -> Option<DropReason> {
        let line = Line::new(line.trim());
        if line.text.is_empty() {
            return None;
        }
        self.classify_line(&line)
    }

    fn classify_line(&self, line: &Line<'_>) -> Option<DropReason> {
        self.rules
            .iter()
            .find(|(_, predicate)| predicate(self, line))
            .map(|(reason, _)| *reason)
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut kept = Vec::new();
        for text in raw.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
            let line = Line::new(text);
            match self.classify_line(&line) {
                Some(reason) => tracing::trace!(?reason, line = text, "dropping lyric line"),
                None => kept.push(text),
            }
        }
        kept.join("\n")
    }
}

fn has_keyword(cleaner: &LyricsCleaner, line: &Line<'_>) -> bool {
    cleaner
        .keywords
        .iter()
        .any(|keyword| line.folded.contains(keyword.as_str()))
}

fn is_number_only(_: &LyricsCleaner, line: &Line<'_>) -> bool {
    NUMBER_ONLY_RE.is_match(line.text)
}

fn is_divider(_: &LyricsCleaner, line: &Line<'_>) -> bool {
    DIVIDER_RE.is_match(line.text)
}

// Short runs of non-ASCII text are usually translation-picker language names.
fn is_language_name(cleaner: &LyricsCleaner, line: &Line<'_>) -> bool {
    !line.is_header
        && line.tokens <= cleaner.max_noise_tokens
        && line.text.chars().any(|c| !c.is_ascii())
}

fn is_short_fragment(cleaner: &LyricsCleaner, line: &Line<'_>) -> bool {
    !line.is_header
        && line.tokens <= cleaner.max_noise_tokens
        && TEXTUAL_RE.is_match(line.text)
}

pub fn is_section_header(line: &str) -> bool {
    SECTION_HEADER_RE.is_match(line)
}

/// Lowercase with diacritics removed; only used as a matching key.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Surrounds every `[Section]` token with breaks, then turns newlines into breaks.
pub fn format_sections(cleaned: &str) -> String {
    SECTION_TOKEN_RE
        .replace_all(cleaned, |caps: &regex::Captures<'_>| {
            format!("{LINE_BREAK}{}{LINE_BREAK}", &caps[0])
        })
        .replace('\n', LINE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_only_input_cleans_to_empty() {
        let cleaner = LyricsCleaner::default();
        let raw = "12 Contributors\nTranslations\nImagine Lyrics\nYou might also like\n1Embed";
        assert_eq!(cleaner.clean(raw), "");
    }

    #[test]
    fn keyword_match_ignores_case_and_accents() {
        let cleaner = LyricsCleaner::default();
        assert_eq!(
            cleaner.classify("Produced bý Phil Spector and John"),
            Some(DropReason::Keyword)
        );
        assert_eq!(
            cleaner.classify("CRÉDITS for this song are listed"),
            Some(DropReason::Keyword)
        );
    }

    #[test]
    fn section_headers_survive_any_length_or_script() {
        let cleaner = LyricsCleaner::default();
        for header in ["[Chorus]", "[Verse 1]", "[Припев]", "[Pre-Chorus: Lennon]"] {
            assert_eq!(cleaner.classify(header), None, "{header}");
        }
        let formatted = format_sections(&cleaner.clean("[Chorus]\n[Припев]"));
        assert_eq!(formatted, "<br>[Chorus]<br><br><br>[Припев]<br>");
    }

    #[test]
    fn digit_rule_only_matches_whole_line() {
        let cleaner = LyricsCleaner::default();
        assert_eq!(cleaner.classify("42"), Some(DropReason::NumberOnly));
        assert_ne!(cleaner.classify("42 ways"), Some(DropReason::NumberOnly));
        assert_eq!(cleaner.clean("42"), "");
    }

    #[test]
    fn dividers_dropped_but_inline_dashes_kept() {
        let cleaner = LyricsCleaner::default();
        assert_eq!(cleaner.classify("----"), Some(DropReason::Divider));
        assert_eq!(cleaner.classify("— — —"), Some(DropReason::Divider));
        assert_eq!(cleaner.clean("I know - I tried"), "I know - I tried");
    }

    #[test]
    fn short_foreign_lines_are_language_names() {
        let cleaner = LyricsCleaner::default();
        assert_eq!(cleaner.classify("Ελληνικά"), Some(DropReason::LanguageName));
        assert_eq!(cleaner.classify("한국어"), Some(DropReason::LanguageName));
        assert_eq!(cleaner.classify("Español"), Some(DropReason::LanguageName));
        assert_eq!(cleaner.classify("Oh yeah"), Some(DropReason::ShortFragment));
    }

    #[test]
    fn clean_keeps_order_and_original_case() {
        let cleaner = LyricsCleaner::default();
        let raw = "  [Verse 1]  \n\nImagine there's no heaven\nContributors: 12\n[Chorus]\nImagine all the people\n";
        let cleaned = cleaner.clean(raw);
        assert_eq!(
            cleaned,
            "[Verse 1]\nImagine there's no heaven\n[Chorus]\nImagine all the people"
        );
        assert_eq!(cleaner.clean(&cleaned), cleaned);
    }

    #[test]
    fn format_wraps_headers_and_replaces_newlines() {
        let formatted =
            format_sections("[Verse 1]\nImagine there's no heaven\n[Chorus]\nImagine all the people");
        assert_eq!(
            formatted,
            "<br>[Verse 1]<br><br>Imagine there's no heaven<br><br>[Chorus]<br><br>Imagine all the people"
        );
        assert!(!formatted.contains('\n'));
    }

    #[test]
    fn format_of_empty_is_empty() {
        assert_eq!(format_sections(""), "");
    }

    #[test]
    fn custom_table_is_respected() {
        let cleaner = LyricsCleaner::new(vec!["Sponsored".to_string()], 0)
            .with_rule(DropReason::ShortFragment, |_, line| line.text.ends_with('?'));
        assert_eq!(cleaner.clean("sponsored content here\nAre you there?\nHi"), "Hi");
    }
}

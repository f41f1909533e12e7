use regex::Regex;
use std::sync::LazyLock;

use crate::fallback::{is_han, is_kana};
use crate::segment::{Segment, split_segments};

/// What a release title says about the media it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTitle {
    /// Leading bracket group, usually the fansub/release group.
    pub group: Option<String>,
    /// Name to use as the primary search query.
    pub name: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ReleaseTitle {
    /// Titles with an episode marker are treated as series.
    pub fn is_episode(&self) -> bool {
        self.episode.is_some()
    }
}

// SxxExx pattern: S01E02, s1e3, etc.
static RE_SXXEXX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})E(\d{1,4})").unwrap()
});

// " - 06", " - 06v2", " - 12.5" style episode marker
static RE_DASH_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s-\s*(\d{1,4})(?:\.\d)?(?:[vV]\d)?(?:\s|$)").unwrap()
});

// 第06话 / 第6集
pub(crate) static RE_CJK_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第\s*(\d{1,4})\s*[话話集]").unwrap()
});

// Bracket group holding just an episode number: [06], [06v2], [第06话]
static RE_BRACKET_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:第)?(\d{1,4})(?:[vV]\d)?(?:[话話集])?(?:\s*END)?$").unwrap()
});

// Video/audio/source tags that are never part of a name
static RE_QUALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{3,4}p|[248]k|hevc|avc|x26[45]|h\.?26[45]|aac|flac|opus|ac3|dts|web-?rip|web-?dl|bd-?rip|dvd-?rip|bdmv|mkv|mp4|\d{1,2}-?bit|ma10p|hi10p|chs|cht|big5|gb|jpsc|jptc)\b",
    )
    .unwrap()
});

static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Clean up a title: replace dots/underscores with spaces, collapse runs of
/// whitespace, trim.
fn clean_title(raw: &str) -> String {
    let replaced = raw.replace(['.', '_'], " ");
    RE_SPACES.replace_all(replaced.trim(), " ").into_owned()
}

fn has_native_script(s: &str) -> bool {
    s.chars().any(|c| is_han(c) || is_kana(c))
}

fn is_latin_name(s: &str) -> bool {
    !s.is_empty() && !has_native_script(s) && s.chars().any(|c| c.is_ascii_alphabetic())
}

/// Parse a release title into its group, primary name and episode marker.
///
/// Only the pieces needed to query a metadata provider are understood. The
/// primary name prefers a romanised name: the first Latin alternative in the
/// plain text, then the first Latin bracket group that is not a quality tag,
/// then whatever plain text remains.
pub fn parse_release_title(title: &str) -> ReleaseTitle {
    let segments = split_segments(title);

    let group = match segments.first() {
        Some(Segment::Bracket(g)) if segments.len() > 1 => Some(g.to_string()),
        _ => None,
    };
    let body = if group.is_some() { &segments[1..] } else { &segments[..] };

    let mut season = None;
    let mut episode = None;
    let mut text_names: Vec<String> = Vec::new();
    let mut bracket_names: Vec<String> = Vec::new();

    for segment in body {
        match *segment {
            Segment::Text(text) => {
                let (name_part, s, e) = split_episode_marker(text);
                season = season.or(s);
                episode = episode.or(e);
                text_names.extend(
                    name_part
                        .split(['/', '／', '|', '｜'])
                        .map(clean_title)
                        .filter(|n| !n.is_empty()),
                );
            }
            Segment::Bracket(content) => {
                if let Some(caps) = RE_BRACKET_EPISODE.captures(content) {
                    episode = episode.or_else(|| caps[1].parse().ok());
                } else if !RE_QUALITY.is_match(content) && is_latin_name(content) {
                    bracket_names.push(clean_title(content));
                }
            }
        }
    }

    let name = text_names
        .iter()
        .find(|n| is_latin_name(n))
        .or_else(|| bracket_names.first())
        .or_else(|| text_names.first())
        .cloned()
        .or_else(|| group.clone())
        .unwrap_or_else(|| clean_title(title));

    ReleaseTitle {
        group,
        name,
        season,
        episode,
    }
}

/// Cut a plain-text segment at its episode marker. Returns the text before
/// the marker plus the season and episode numbers found.
fn split_episode_marker(text: &str) -> (&str, Option<u32>, Option<u32>) {
    if let Some(caps) = RE_SXXEXX.captures(text) {
        let start = caps.get(0).map_or(text.len(), |m| m.start());
        return (
            &text[..start],
            caps[1].parse().ok(),
            caps[2].parse().ok(),
        );
    }

    for re in [&*RE_DASH_EPISODE, &*RE_CJK_EPISODE] {
        if let Some(caps) = re.captures(text) {
            let start = caps.get(0).map_or(text.len(), |m| m.start());
            return (&text[..start], None, caps[1].parse().ok());
        }
    }

    (text, None, None)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

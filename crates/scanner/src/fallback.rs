//! Native-script (Han) fallback names.
//!
//! Release titles from Chinese fansub groups usually carry the Chinese title
//! next to a romanised one. When a search by the romanised name finds
//! nothing, the Chinese title is the next best query.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::parser::RE_CJK_EPISODE;
use crate::segment::{Segment, split_segments};

/// Punctuation allowed inside a Han run.
const RUN_PUNCTUATION: &[char] = &[
    '～', '~', '・', '·', '：', '！', '？', '、', '，', '!', '?', ' ', '\u{3000}',
];

/// Characters trimmed from the end of a run.
const RUN_TRIM: &[char] = &[' ', '\u{3000}', '、', '，', '・', '·'];

/// Separators between alternate names in plain text.
const NAME_SEPARATORS: &[char] = &['/', '／', '|', '｜'];

const MIN_HAN_CHARS: usize = 2;

// Subtitle and release tags written in Han characters
static RE_TAG_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"字幕|内封|內封|内嵌|內嵌|外挂|外掛|简繁|繁简|简体|繁体|繁體|简中|繁中|简日|繁日|中日|双语|雙語|生肉|合集|新番|招募|先行版",
    )
    .unwrap()
});

// Release group names
static RE_GROUP_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"字幕|汉化|漢化|压制|壓制|工作室|家族|[组組社]$").unwrap()
});

/// CJK Unified Ideographs, extension A/B and compatibility ideographs.
pub fn is_han(c: char) -> bool {
    matches!(
        c,
        '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '〇'
            | '々'
    )
}

/// Hiragana, katakana and halfwidth katakana letters.
pub fn is_kana(c: char) -> bool {
    matches!(
        c,
        '\u{3041}'..='\u{3096}'
            | '\u{30A1}'..='\u{30FA}'
            | '\u{31F0}'..='\u{31FF}'
            | '\u{FF66}'..='\u{FF9D}'
    )
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, 'Ａ'..='Ｚ' | 'ａ'..='ｚ')
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '０'..='９')
}

/// Extract the Han candidate name from a release title.
///
/// `noisy_name` is a name already pulled out of the title elsewhere that may
/// still carry group tags and kana; it is cleaned first and the raw title is
/// only used when it yields nothing. Returns `None` when neither holds a Han
/// name. Running this on its own output returns the output unchanged.
pub fn extract_candidate_name(title: &str, noisy_name: Option<&str>) -> Option<String> {
    if let Some(noisy) = noisy_name {
        if let Some(name) = first_candidate(noisy) {
            debug!(noisy, name = %name, "fallback name from pre-extracted name");
            return Some(name);
        }
    }

    let name = first_candidate(title);
    debug!(title, ?name, "fallback name from title");
    name
}

/// First qualifying segment, left to right. A leading bracket group is
/// normally the release group and only used when nothing else qualifies.
fn first_candidate(input: &str) -> Option<String> {
    let mut leading = None;

    for (i, segment) in split_segments(input).into_iter().enumerate() {
        match segment {
            Segment::Bracket(content) => {
                let Some(name) = bracket_candidate(content) else {
                    continue;
                };
                if i == 0 {
                    if !RE_GROUP_WORDS.is_match(content) {
                        leading = Some(name);
                    }
                    continue;
                }
                return Some(name);
            }
            Segment::Text(text) => {
                if let Some(name) = text_candidate(text) {
                    return Some(name);
                }
            }
        }
    }

    leading
}

/// A bracket group qualifies only when its whole content is a Han name.
fn bracket_candidate(content: &str) -> Option<String> {
    if content
        .chars()
        .any(|c| is_latin(c) || is_kana(c) || is_digit(c))
    {
        return None;
    }
    if RE_TAG_WORDS.is_match(content) {
        return None;
    }

    let run = han_run(content)?;
    (run == content).then_some(run)
}

/// Plain text up to the first name separator or episode marker, unless it
/// carries kana.
fn text_candidate(text: &str) -> Option<String> {
    let head = text
        .find(NAME_SEPARATORS)
        .map_or(text, |pos| &text[..pos]);
    let head = RE_CJK_EPISODE
        .find(head)
        .map_or(head, |m| &head[..m.start()]);
    if head.chars().any(is_kana) {
        return None;
    }
    han_run(head)
}

/// First run of Han characters and interior punctuation holding at least
/// [`MIN_HAN_CHARS`] Han characters.
fn han_run(text: &str) -> Option<String> {
    let mut rest = text;

    while let Some(start) = rest.find(is_han) {
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| !(is_han(c) || RUN_PUNCTUATION.contains(&c)))
            .unwrap_or(tail.len());
        let run = tail[..end].trim_end_matches(RUN_TRIM);

        if run.chars().filter(|c| is_han(*c)).count() >= MIN_HAN_CHARS {
            return Some(run.to_string());
        }
        rest = &tail[end..];
    }

    None
}

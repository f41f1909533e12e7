//! Splits release titles into bracket groups and the plain text between them.

/// A piece of a release title, in the order it appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Trimmed content of a `[...]` or `【...】` group.
    Bracket(&'a str),
    /// Text outside any bracket group, untrimmed.
    Text(&'a str),
}

/// Split `input` into segments. Text made only of separators (`_`, `-`, `.`,
/// whitespace) is dropped, so the first segment is the first meaningful one.
/// An unclosed bracket is kept as plain text.
pub fn split_segments(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = input;

    loop {
        let Some(open) = rest.find(['[', '【']) else {
            push_text(&mut segments, rest);
            break;
        };
        let (opener_len, close) = if rest[open..].starts_with('[') {
            (1, ']')
        } else {
            ('【'.len_utf8(), '】')
        };
        let body = &rest[open + opener_len..];
        let Some(end) = body.find(close) else {
            push_text(&mut segments, rest);
            break;
        };

        push_text(&mut segments, &rest[..open]);
        segments.push(Segment::Bracket(body[..end].trim()));
        rest = &body[end + close.len_utf8()..];
    }

    segments
}

fn push_text<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    if text
        .chars()
        .any(|c| !(c.is_whitespace() || matches!(c, '_' | '-' | '.')))
    {
        segments.push(Segment::Text(text));
    }
}

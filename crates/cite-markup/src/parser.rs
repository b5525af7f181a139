//! Directive syntax scanning.
//!
//! Three shapes are recognized: inline `:name[content]{attrs}` anywhere in
//! a line, leaf `::name[content]{attrs}` on a line of its own, and
//! container `:::name{attrs}` ... `:::` spanning several lines.

use std::ops::Range;

use crate::args::DirectiveArgs;

/// Directive occupying a whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockDirective {
    /// `::name[content]{attrs}`
    Leaf { name: String, args: DirectiveArgs },
    /// `:::name[content]{attrs}`
    ContainerStart {
        name: String,
        args: DirectiveArgs,
        colon_count: usize,
    },
    /// `:::`
    ContainerEnd { colon_count: usize },
}

/// Inline directive found inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InlineDirective {
    pub name: String,
    pub args: DirectiveArgs,
    /// Byte offset of the leading colon.
    pub start: usize,
    /// Byte offset just past the directive.
    pub end: usize,
}

/// Parse a line as a leaf or container directive.
///
/// Returns `None` if the line is anything else, including a leaf with
/// trailing text.
pub(crate) fn parse_block_line(line: &str) -> Option<BlockDirective> {
    let trimmed = line.trim();
    let colon_count = trimmed.chars().take_while(|&c| c == ':').count();
    if colon_count < 2 {
        return None;
    }

    let after_colons = &trimmed[colon_count..];
    if after_colons.is_empty() {
        return (colon_count >= 3).then_some(BlockDirective::ContainerEnd { colon_count });
    }

    let (name, args, consumed) = parse_name_and_args(after_colons)?;
    let name = name.to_owned();

    if colon_count == 2 {
        if !after_colons[consumed..].trim().is_empty() {
            return None;
        }
        return Some(BlockDirective::Leaf { name, args });
    }

    Some(BlockDirective::ContainerStart {
        name,
        args,
        colon_count,
    })
}

/// Find the next inline directive in `line` at or after byte `from`.
///
/// Every single colon is a candidate, so text like `see: :ref[a]` still
/// finds the directive. A candidate needs brackets or braces; a bare
/// `:word` is plain text. Colons inside code spans are skipped.
pub(crate) fn next_inline(line: &str, from: usize) -> Option<InlineDirective> {
    let code = code_spans(line);

    line.match_indices(':')
        .map(|(start, _)| start)
        .filter(|&start| start >= from && is_directive_start(line, start, &code))
        .find_map(|start| {
            let (name, args, consumed) = parse_name_and_args(&line[start + 1..])?;
            (!args.is_bare()).then(|| InlineDirective {
                name: name.to_owned(),
                args,
                start,
                end: start + 1 + consumed,
            })
        })
}

/// Whether `text` holds the opening of an inline `name` directive,
/// closed or not.
///
/// Uses the same boundary rules as [`next_inline`].
pub(crate) fn has_inline_opening(text: &str, name: &str) -> bool {
    let code = code_spans(text);

    text.match_indices(':').any(|(start, _)| {
        is_directive_start(text, start, &code)
            && text[start + 1..]
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with(['[', '{']))
    })
}

/// Whether the colon at byte `idx` can open an inline directive.
///
/// It must not follow a word character or another colon, must not be
/// followed by a colon, and must lie outside `code`.
fn is_directive_start(text: &str, idx: usize, code: &[Range<usize>]) -> bool {
    let after_word = text[..idx]
        .chars()
        .next_back()
        .is_some_and(|c| c == ':' || c == '_' || c.is_alphanumeric());

    !after_word
        && text.as_bytes().get(idx + 1) != Some(&b':')
        && !code.iter().any(|span| span.contains(&idx))
}

/// Byte ranges of backtick code spans and `<code>` elements.
fn code_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];

        if rest.starts_with('`') {
            let run = rest.bytes().take_while(|&b| b == b'`').count();
            match closing_backticks(&rest[run..], run) {
                Some(end) => {
                    spans.push(pos..pos + run + end);
                    pos += run + end;
                }
                None => pos += run,
            }
            continue;
        }

        if rest.starts_with("<code")
            && rest[5..].starts_with(['>', ' '])
            && let Some(close) = rest.find("</code>")
        {
            let end = close + "</code>".len();
            spans.push(pos..pos + end);
            pos += end;
            continue;
        }

        pos += rest.chars().next().map_or(1, char::len_utf8);
    }

    spans
}

/// Bytes up to and including a run of exactly `run` backticks.
fn closing_backticks(s: &str, run: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'`' {
            let len = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if len == run {
                return Some(i + len);
            }
            i += len;
        } else {
            i += 1;
        }
    }
    None
}

/// Parse `name[content]{attrs}` from the start of `s`.
///
/// Returns the name, arguments and bytes consumed.
fn parse_name_and_args(s: &str) -> Option<(&str, DirectiveArgs, usize)> {
    let name_end = s
        .find(|c: char| c == '[' || c == '{' || c.is_whitespace())
        .unwrap_or(s.len());
    let name = &s[..name_end];
    if !is_valid_directive_name(name) {
        return None;
    }

    let mut pos = name_end;
    let content = balanced(&s[pos..], '[', ']').map(|(inner, consumed)| {
        pos += consumed;
        inner
    });
    let attrs = balanced(&s[pos..], '{', '}').map_or("", |(inner, consumed)| {
        pos += consumed;
        inner
    });

    Some((name, DirectiveArgs::parse(content, attrs), pos))
}

/// Check if a name is a valid directive name.
///
/// Valid names contain only alphanumeric characters, hyphens, and underscores.
pub(crate) fn is_valid_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Delimited span at the start of `s`, honoring nesting.
///
/// Returns the inner text and bytes consumed, or `None` if `s` does not
/// start with `open` or the span is never closed.
fn balanced(s: &str, open: char, close: char) -> Option<(&str, usize)> {
    if !s.starts_with(open) {
        return None;
    }

    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some((&s[1..i], i + 1));
            }
        }
    }
    None
}

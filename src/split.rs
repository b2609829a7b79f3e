//! Top-level split of mixed HTML and Markdown input.
//!
//! The input is scanned line by line. A line that starts with a well formed
//! HTML element whose matching close tag ends a line (possibly a later one)
//! becomes an HTML segment; everything else accumulates into Markdown runs.
//! Fenced code blocks (including those opened inside list items and block
//! quotes) and HTML comments are never scanned for HTML. Malformed or
//! unterminated tags are left in the Markdown run untouched.

use crate::html;
use crate::node::{Node, is_void};

/// One top-level piece of the input, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Parsed top-level HTML.
    Html(Vec<Node>),
    /// Opaque Markdown run, transformed later.
    Markdown(String),
}

/// Splits `input` into ordered top-level segments.
///
/// Only block-level HTML is split out. HTML starting mid-line belongs to its
/// Markdown paragraph and is nested by the transformer instead.
/// Whitespace-only runs between segments are discarded.
pub fn split(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut run_start = 0;
    let mut pos = 0;
    let mut fence: Option<Fence> = None;

    while pos < input.len() {
        let eol = line_end(input, pos);
        let line = &input[pos..eol];

        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            pos = next_line(input, eol);
            continue;
        }

        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            pos = next_line(input, eol);
            continue;
        }

        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent <= 3 && line[indent..].starts_with("<!--") {
            // Unterminated comments run to the end of the input
            let body = pos + indent + 2;
            pos = match input[body..].find("-->") {
                Some(offset) => next_line(input, line_end(input, body + offset + 3)),
                None => input.len(),
            };
            continue;
        }

        if indent <= 3
            && let Some(end) = block_element_end(input, pos + indent)
        {
            let nodes = html::parse_fragment(&input[pos + indent..end], 0);
            if !nodes.is_empty() {
                push_markdown(&mut segments, &input[run_start..pos]);
                segments.push(Segment::Html(nodes));
                pos = next_line(input, line_end(input, end));
                run_start = pos;
                continue;
            }
        }

        pos = next_line(input, eol);
    }

    push_markdown(&mut segments, &input[run_start..]);
    segments
}

fn push_markdown(segments: &mut Vec<Segment>, run: &str) {
    if !run.trim().is_empty() {
        segments.push(Segment::Markdown(run.to_string()));
    }
}

fn line_end(input: &str, pos: usize) -> usize {
    input[pos..].find('\n').map_or(input.len(), |i| pos + i)
}

fn next_line(input: &str, eol: usize) -> usize {
    if eol < input.len() {
        eol + 1
    } else {
        input.len()
    }
}

/// Fenced code block opener.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: u8,
    len: usize,
    /// Opened after list item or block quote markers.
    nested: bool,
}

impl Fence {
    fn open(line: &str) -> Option<Self> {
        let (content, nested) = strip_container_markers(line);
        let trimmed = content.trim_start_matches(' ');
        if content.len() - trimmed.len() > 3 {
            return None;
        }

        let marker = *trimmed.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }

        let len = trimmed.bytes().take_while(|&b| b == marker).count();
        if len < 3 {
            return None;
        }

        // Backtick fences cannot carry backticks in the info string
        if marker == b'`' && trimmed[len..].contains('`') {
            return None;
        }

        Some(Self {
            marker,
            len,
            nested,
        })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = if self.nested {
            strip_container_markers(line).0.trim_start()
        } else {
            let trimmed = line.trim_start_matches(' ');
            if line.len() - trimmed.len() > 3 {
                return false;
            }
            trimmed
        };

        let len = trimmed.bytes().take_while(|&b| b == self.marker).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}

/// Strips leading block quote (`>`) and list item (`-`, `*`, `+`, `1.`,
/// `1)`) markers, returning the rest of the line and whether any were found.
fn strip_container_markers(line: &str) -> (&str, bool) {
    let mut rest = line;
    let mut nested = false;

    loop {
        let trimmed = rest.trim_start_matches(' ');
        let after = match trimmed.strip_prefix('>') {
            Some(after) => after,
            None => match list_marker_len(trimmed) {
                Some(len) => &trimmed[len..],
                None => return (rest, nested),
            },
        };
        rest = after;
        nested = true;
    }
}

/// Length of a list item marker at the start of `line`, if any.
fn list_marker_len(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let len = match bytes.first()? {
        b'-' | b'*' | b'+' => 1,
        _ => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if !(1..=9).contains(&digits) || !matches!(bytes.get(digits), Some(b'.' | b')')) {
                return None;
            }
            digits + 1
        }
    };

    match bytes.get(len) {
        None | Some(b' ' | b'\t') => Some(len),
        _ => None,
    }
}

/// Opening tag recognised at some position.
struct OpenTag<'a> {
    name: &'a str,
    end: usize,
    self_closing: bool,
}

/// Returns the end offset of a block-level element starting at `start`.
///
/// The element must be complete (void, self-closing, or with a matching
/// close tag) and nothing but whitespace may follow it on its last line.
fn block_element_end(input: &str, start: usize) -> Option<usize> {
    let open = parse_open_tag(input, start)?;

    let end = if open.self_closing || is_void(open.name) {
        open.end
    } else {
        find_close(input, open.name, open.end)?
    };

    let rest = &input[end..line_end(input, end)];
    rest.trim().is_empty().then_some(end)
}

/// Parses `<name attr="value" ...>` at `start`.
fn parse_open_tag(input: &str, start: usize) -> Option<OpenTag<'_>> {
    let bytes = input.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }

    let name_start = start + 1;
    if !bytes.get(name_start)?.is_ascii_alphabetic() {
        return None;
    }
    let mut pos = name_start;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
        pos += 1;
    }
    let name = &input[name_start..pos];

    loop {
        let before = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        match *bytes.get(pos)? {
            b'>' => {
                return Some(OpenTag {
                    name,
                    end: pos + 1,
                    self_closing: false,
                });
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                return Some(OpenTag {
                    name,
                    end: pos + 2,
                    self_closing: true,
                });
            }
            _ if pos == before => return None,
            _ => pos = parse_attribute(bytes, pos)?,
        }
    }
}

/// Parses one attribute starting at `pos`, returning the offset after it.
fn parse_attribute(bytes: &[u8], mut pos: usize) -> Option<usize> {
    let is_name_byte =
        |b: u8| !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'=' | b'"' | b'\'' | b'<');

    let name_start = pos;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }

    let mut after_name = pos;
    while after_name < bytes.len() && bytes[after_name].is_ascii_whitespace() {
        after_name += 1;
    }
    if bytes.get(after_name) != Some(&b'=') {
        return Some(pos);
    }

    pos = after_name + 1;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    match *bytes.get(pos)? {
        quote @ (b'"' | b'\'') => {
            let close = bytes[pos + 1..].iter().position(|&b| b == quote)?;
            Some(pos + 1 + close + 1)
        }
        _ => {
            let value_start = pos;
            while pos < bytes.len()
                && !bytes[pos].is_ascii_whitespace()
                && !matches!(bytes[pos], b'>' | b'"' | b'\'' | b'=' | b'<' | b'`')
            {
                pos += 1;
            }
            (pos > value_start).then_some(pos)
        }
    }
}

/// Finds the end of the close tag matching an open `name` element.
fn find_close(input: &str, name: &str, from: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = 1usize;
    let mut pos = from;

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;

        if bytes.get(lt + 1) == Some(&b'/') {
            if let Some(end) = match_close_tag(bytes, lt + 2, name) {
                depth -= 1;
                if depth == 0 {
                    return Some(end);
                }
                pos = end;
                continue;
            }
        } else if starts_with_name(bytes, lt + 1, name)
            && let Some(open) = parse_open_tag(input, lt)
        {
            if !open.self_closing {
                depth += 1;
            }
            pos = open.end;
            continue;
        }

        pos = lt + 1;
    }

    None
}

/// True if `name` appears at `pos`, followed by a tag name delimiter.
fn starts_with_name(bytes: &[u8], pos: usize, name: &str) -> bool {
    let end = pos + name.len();
    bytes.get(pos..end).is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()))
        && bytes
            .get(end)
            .is_some_and(|&b| b.is_ascii_whitespace() || b == b'>' || b == b'/')
}

/// Matches `name>` or `name   >` at `pos`, returning the offset after `>`.
fn match_close_tag(bytes: &[u8], pos: usize, name: &str) -> Option<usize> {
    let end = pos + name.len();
    if !bytes.get(pos..end)?.eq_ignore_ascii_case(name.as_bytes()) {
        return None;
    }

    let mut cursor = end;
    while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
        cursor += 1;
    }
    (bytes.get(cursor) == Some(&b'>')).then_some(cursor + 1)
}

//! Bracket annotation lexer
//!
//! Annotations are embedded in arbitrary prose and look like `[R1:]`,
//! `[D4 => R1]` or `[=>T2]`. Anything in brackets that does not follow the
//! grammar is ordinary text and is skipped without a warning.

use crate::tag::Tag;
use facet::Facet;
use std::fmt::{Display, Formatter};

/// Byte span of an annotation within its line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
pub struct SourceSpan {
    /// Byte offset from start of line
    pub offset: usize,
    /// Byte length
    pub length: usize,
}

impl SourceSpan {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// What an annotation says about its left-hand tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum TagOp {
    /// `:` - the surrounding text defines the left tag
    Define,
    /// `=>` - the left tag covers/addresses the right tag
    Cover,
}

impl TagOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagOp::Define => ":",
            TagOp::Cover => "=>",
        }
    }
}

impl Display for TagOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[left op right]` annotation
///
/// Either side may be omitted; resolving an omitted left tag is up to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TagRef {
    pub left: Option<Tag>,
    pub op: TagOp,
    pub right: Option<Tag>,
    pub span: SourceSpan,
}

/// Lazy iterator over the annotations of one line, left to right.
pub struct TagRefs<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> TagRefs<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }
}

impl Iterator for TagRefs<'_> {
    type Item = TagRef;

    fn next(&mut self) -> Option<TagRef> {
        while self.pos < self.line.len() {
            let start = self.pos + self.line[self.pos..].find('[')?;
            match parse_annotation(self.line.as_bytes(), start) {
                Some(tag_ref) => {
                    self.pos = tag_ref.span.end();
                    return Some(tag_ref);
                }
                None => self.pos = start + 1,
            }
        }
        None
    }
}

/// Extract every annotation on a line.
pub fn extract(line: &str) -> TagRefs<'_> {
    TagRefs::new(line)
}

/// Remove every annotation (and a link target directly following it) from a
/// line, then trim whitespace and a trailing line-continuation backslash.
pub fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut copied = 0;

    for tag_ref in extract(line) {
        out.push_str(&line[copied..tag_ref.span.offset]);
        copied = tag_ref.span.end();

        // `[R1:](#R1)` - the link target belongs to the annotation
        let rest = &line[copied..];
        if rest.starts_with('(') {
            if let Some(close) = rest.find(')') {
                copied += close + 1;
            }
        }
    }
    out.push_str(&line[copied..]);

    let text = out.trim();
    text.strip_suffix('\\').unwrap_or(text).trim_end().to_string()
}

/// Try to match `[ deco? tag? deco? " "? op " "? tag? ]` starting at the
/// `[` at `start`.
fn parse_annotation(bytes: &[u8], start: usize) -> Option<TagRef> {
    let mut i = start + 1;

    i = skip_while(bytes, i, |b| b == b'*');
    let (left, after_left) = read_tag(bytes, i)?;
    i = skip_while(bytes, after_left, |b| b == b'*');
    i = skip_one(bytes, i, b' ');

    let op = if bytes[i..].starts_with(b"=>") {
        i += 2;
        TagOp::Cover
    } else if bytes.get(i) == Some(&b':') {
        i += 1;
        TagOp::Define
    } else {
        return None;
    };

    i = skip_one(bytes, i, b' ');
    let (right, after_right) = read_tag(bytes, i)?;
    i = after_right;

    if bytes.get(i) != Some(&b']') {
        return None;
    }

    Some(TagRef {
        left,
        op,
        right,
        span: SourceSpan::new(start, i + 1 - start),
    })
}

/// Read an optional tag id. `None` means the characters there look like a
/// tag but break the grammar, so the whole annotation is rejected.
fn read_tag(bytes: &[u8], start: usize) -> Option<(Option<Tag>, usize)> {
    let end = skip_while(bytes, start, |b| {
        b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'.'
    });
    if end == start {
        return Some((None, end));
    }

    // Only ASCII was consumed, so the slice sits on char boundaries
    let id = std::str::from_utf8(&bytes[start..end]).ok()?;
    Some((Some(Tag::parse(id)?), end))
}

fn skip_while(bytes: &[u8], mut i: usize, pred: impl Fn(u8) -> bool) -> usize {
    while i < bytes.len() && pred(bytes[i]) {
        i += 1;
    }
    i
}

fn skip_one(bytes: &[u8], i: usize, byte: u8) -> usize {
    if bytes.get(i) == Some(&byte) { i + 1 } else { i }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(line: &str) -> Vec<(Option<String>, TagOp, Option<String>)> {
        extract(line)
            .map(|r| {
                (
                    r.left.map(|t| t.to_string()),
                    r.op,
                    r.right.map(|t| t.to_string()),
                )
            })
            .collect()
    }

    fn s(tag: &str) -> Option<String> {
        Some(tag.to_string())
    }

    #[test]
    fn test_extract_definition() {
        assert_eq!(
            triples("[R1:] The pump shall stop."),
            vec![(s("R1"), TagOp::Define, None)]
        );
    }

    #[test]
    fn test_extract_coverage_with_spaces() {
        assert_eq!(
            triples("[D2 => R1] and [T3=>R1]"),
            vec![
                (s("D2"), TagOp::Cover, s("R1")),
                (s("T3"), TagOp::Cover, s("R1")),
            ]
        );
    }

    #[test]
    fn test_extract_omitted_sides() {
        assert_eq!(
            triples("[=>H1] then [:]"),
            vec![(None, TagOp::Cover, s("H1")), (None, TagOp::Define, None)]
        );
    }

    #[test]
    fn test_extract_strips_emphasis() {
        assert_eq!(
            triples("[**R10.2**:] bold and [*D*:] italic"),
            vec![
                (s("R10.2"), TagOp::Define, None),
                (s("D"), TagOp::Define, None),
            ]
        );
    }

    #[test]
    fn test_extract_order_and_spans() {
        let line = "x [R1:] y [R1=>H1]";
        let refs: Vec<_> = extract(line).collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].span, SourceSpan::new(2, 5));
        assert_eq!(&line[refs[1].span.offset..refs[1].span.end()], "[R1=>H1]");
    }

    #[test]
    fn test_ignore_non_annotations() {
        assert!(triples("array[0] and [x]: url and [ ] todo").is_empty());
        assert!(triples("[r1:] lowercase, [R1-2:] dash, [ABCD:] long").is_empty());
        assert!(triples("[R1:=] and [R1?=] are not operators").is_empty());
        assert!(triples("[R1  :] two spaces").is_empty());
        assert!(triples("unterminated [R1:").is_empty());
    }

    #[test]
    fn test_malformed_bracket_does_not_hide_next() {
        assert_eq!(
            triples("[[R1:] nested opener"),
            vec![(s("R1"), TagOp::Define, None)]
        );
    }

    #[test]
    fn test_non_ascii_prose() {
        assert_eq!(
            triples("Überwachung [R7:] — größer"),
            vec![(s("R7"), TagOp::Define, None)]
        );
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("[R1:] The pump shall stop."), "The pump shall stop.");
        assert_eq!(strip_tags("[D:] text"), "text");
        assert_eq!(strip_tags("  [R1:](#R1) Alarm [=>H1](hazards.md#H1) \\"), "Alarm");
        assert_eq!(strip_tags("[R1:] [=>H1]"), "");
        assert_eq!(strip_tags("no annotations"), "no annotations");
    }

    #[test]
    fn test_strip_keeps_unrelated_parentheses() {
        assert_eq!(strip_tags("[R2:] limit (see table)"), "limit (see table)");
    }

    #[test]
    fn test_op_display() {
        assert_eq!(TagOp::Define.to_string(), ":");
        assert_eq!(TagOp::Cover.to_string(), "=>");
    }
}

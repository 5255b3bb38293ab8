use std::ops::Range;

/// One `{{ ... }}` occurrence inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSpan<'a> {
    /// Byte offset of the opening `{{`.
    pub start: usize,
    /// Byte offset just past the closing `}}`.
    pub end: usize,
    /// Raw text between the markers.
    pub inner: &'a str,
}

impl DirectiveSpan<'_> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Locate every directive span in `text`, left to right.
///
/// A span's body is non-empty and contains no `}`. When another `{{` shows up
/// before the body closes, the earlier marker is literal text and the
/// candidate restarts at the inner one, so spans never nest or overlap.
pub fn scan(text: &str) -> Vec<DirectiveSpan<'_>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut cursor = 0usize;

    while let Some(open) = find_open(text, cursor) {
        match close_candidate(bytes, open) {
            Candidate::Span(close) => {
                spans.push(DirectiveSpan {
                    start: open,
                    end: close + 2,
                    inner: &text[open + 2..close],
                });
                cursor = close + 2;
            }
            Candidate::Restart(next) => cursor = next,
            Candidate::Exhausted => break,
        }
    }

    spans
}

enum Candidate {
    /// Offset of the first `}` of the closing marker.
    Span(usize),
    /// Resume the search at this offset.
    Restart(usize),
    /// No `}` left in the input.
    Exhausted,
}

fn find_open(text: &str, from: usize) -> Option<usize> {
    text.get(from..)?.find("{{").map(|i| from + i)
}

fn close_candidate(bytes: &[u8], open: usize) -> Candidate {
    let mut i = open + 2;
    while i < bytes.len() {
        match bytes[i] {
            b'}' => {
                let closed = bytes.get(i + 1) == Some(&b'}');
                return if closed && i > open + 2 {
                    Candidate::Span(i)
                } else {
                    Candidate::Restart(open + 1)
                };
            }
            b'{' if bytes.get(i + 1) == Some(&b'{') => return Candidate::Restart(i),
            _ => i += 1,
        }
    }
    Candidate::Exhausted
}

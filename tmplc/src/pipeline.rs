//! Directive body normalisation: comment removal, whitespace collapsing and
//! splitting into command tokens.

/// The whitespace class that separates tokens: space, tab, newline, carriage
/// return, form feed and vertical tab.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// The normalised token sequence of one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    tokens: Vec<String>,
}

impl Pipeline {
    /// Normalise a directive's inner text. Returns `None` when nothing is
    /// left once comments and whitespace are gone.
    pub fn parse(inner: &str) -> Option<Pipeline> {
        let uncommented = strip_comments(inner.trim_matches(is_separator));
        let tokens: Vec<String> = uncommented
            .split(is_separator)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if tokens.is_empty() {
            None
        } else {
            Some(Pipeline { tokens })
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First token: the command keyword, or the head of a bare expression.
    pub fn head(&self) -> &str {
        &self.tokens[0]
    }

    /// Everything after the head.
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// The tokens rejoined with single spaces.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Remove `/* ... */` runs. A comment closes at the last `*/` on the line it
/// opened on, so asterisks inside the comment body are fine; a comment left
/// open at the end of its line is kept as text.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("/*") {
        let line_end = rest[open..].find('\n').map_or(rest.len(), |i| open + i);
        match rest[open + 2..line_end].rfind("*/") {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + 2 + close + 2..];
            }
            None => {
                out.push_str(&rest[..open + 2]);
                rest = &rest[open + 2..];
            }
        }
    }

    out.push_str(rest);
    out
}

//! Context-path resolution.
//!
//! Each nesting level that rebinds `.` gets its own variable name so that the
//! closures generated for nested blocks can still see their ancestors:
//!
//! | level | name  |
//! |-------|-------|
//! | 0     | `$$`  |
//! | 1     | `$$1` |
//! | n     | `$$n` |
//!
//! Level 0 is the body of a `define` (or a document with no enclosing block).
//! Every `with` adds a level; `range` does not. The root argument `$` and the
//! deferred-call array `$$$` sit outside the chain and are always in scope
//! inside a defined unit.

use std::fmt;

/// The positional parameter of every defined unit.
pub const ROOT_BINDING: &str = "$";

/// The deferred-call parameter of every defined unit.
pub const DEFERRED_BINDING: &str = "$$$";

/// The variable a nesting level binds `.` to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binding {
    level: usize,
}

impl Binding {
    pub const BASE: Binding = Binding { level: 0 };

    /// The binding a block nested one level deeper introduces.
    pub fn child(self) -> Binding {
        Binding {
            level: self.level + 1,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.level == 0 {
            write!(f, "$$")
        } else {
            write!(f, "$${}", self.level)
        }
    }
}

/// Rewrite a single operand: `.` and `.Path` become references off `current`,
/// anything else is passed through untouched.
pub fn resolve_operand(token: &str, current: Binding) -> String {
    if token == "." {
        current.to_string()
    } else if token.starts_with('.') {
        format!("{current}{token}")
    } else {
        token.to_string()
    }
}

/// Rewrite every operand and rejoin them with single spaces.
pub fn resolve_operands<S: AsRef<str>>(tokens: &[S], current: Binding) -> String {
    tokens
        .iter()
        .map(|t| resolve_operand(t.as_ref(), current))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve the head of a bare substitution. `None` means the token has none
/// of the recognised shapes and nothing should be emitted.
pub fn resolve_bare(token: &str, current: Binding) -> Option<String> {
    if token.starts_with('.') {
        Some(resolve_operand(token, current))
    } else if is_string_literal(token) || token.starts_with('$') {
        Some(token.to_string())
    } else {
        None
    }
}

// Tokens are split on whitespace before this point, so `"a b"` arrives as the
// head `"a` and is not a literal.
fn is_string_literal(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

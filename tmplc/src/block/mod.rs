pub mod range;

use std::fmt;

use crate::resolver::{Binding, DEFERRED_BINDING, ROOT_BINDING, resolve_operand};

pub use range::{LoopVars, Range};

/// The four block directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Define,
    With,
    Range,
    Template,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Define => "define",
            BlockKind::With => "with",
            BlockKind::Range => "range",
            BlockKind::Template => "template",
        };
        f.write_str(name)
    }
}

/// Why a node refused an `else` branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElseRejection {
    /// The node kind has no falsy arm.
    Unsupported,
    /// The node already switched to its falsy arm.
    Repeated,
}

/// A parsed block directive and the code it generates.
///
/// `start` is emitted in place of the opening directive, `or_else` in place of
/// an `{{else}}`, and `end` in place of the matching `{{end}}`. `Template` has
/// no body: `start` is the whole fragment and it never sits on the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockNode {
    Define(Define),
    With(With),
    Range(Range),
    Template(Template),
}

impl BlockNode {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockNode::Define(_) => BlockKind::Define,
            BlockNode::With(_) => BlockKind::With,
            BlockNode::Range(_) => BlockKind::Range,
            BlockNode::Template(_) => BlockKind::Template,
        }
    }

    pub fn start(&self) -> String {
        match self {
            BlockNode::Define(node) => node.start(),
            BlockNode::With(node) => node.start(),
            BlockNode::Range(node) => node.start(),
            BlockNode::Template(node) => node.start(),
        }
    }

    /// Switch to the falsy arm. Valid at most once per node, before `end`.
    pub fn or_else(&mut self) -> Result<String, ElseRejection> {
        match self {
            BlockNode::With(node) => node.or_else(),
            BlockNode::Range(node) => node.or_else(),
            BlockNode::Define(_) | BlockNode::Template(_) => Err(ElseRejection::Unsupported),
        }
    }

    pub fn end(self) -> String {
        match self {
            BlockNode::Define(node) => node.end(),
            BlockNode::With(node) => node.end(),
            BlockNode::Range(node) => node.end(),
            BlockNode::Template(_) => String::new(),
        }
    }

    /// The binding `.` refers to inside this node's body, if the node
    /// introduces one.
    pub fn binding(&self) -> Option<Binding> {
        match self {
            BlockNode::Define(_) => Some(Binding::BASE),
            BlockNode::With(node) => Some(node.binding),
            BlockNode::Range(_) | BlockNode::Template(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// define
// ---------------------------------------------------------------------------

/// A named, reusable rendering unit registered with the component registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub registry: String,
    pub name: String,
    deferred: Vec<String>,
}

impl Define {
    pub fn new(registry: impl Into<String>, name: impl Into<String>) -> Self {
        Define {
            registry: registry.into(),
            name: name.into(),
            deferred: Vec::new(),
        }
    }

    /// Collect a call to run before the unit renders. Returns the expression
    /// that refers to its result inside the body.
    pub fn defer(&mut self, call: impl Into<String>) -> String {
        self.deferred.push(call.into());
        format!("{}[{}]", DEFERRED_BINDING, self.deferred.len() - 1)
    }

    fn start(&self) -> String {
        format!(
            "{}.define({},({},{})=>{{let {}={};return`",
            self.registry,
            self.name,
            ROOT_BINDING,
            DEFERRED_BINDING,
            Binding::BASE,
            ROOT_BINDING
        )
    }

    fn end(self) -> String {
        if self.deferred.is_empty() {
            "`});".to_string()
        } else {
            format!("`}},[{}]);", self.deferred.join(","))
        }
    }
}

// ---------------------------------------------------------------------------
// with
// ---------------------------------------------------------------------------

/// Conditional rebinding of `.` to `subject`.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    /// Resolved against the enclosing level.
    pub subject: String,
    /// The name `.` takes inside the body.
    pub binding: Binding,
    has_else: bool,
}

impl With {
    pub fn new(subject: impl Into<String>, binding: Binding) -> Self {
        With {
            subject: subject.into(),
            binding,
            has_else: false,
        }
    }

    fn start(&self) -> String {
        format!("${{{}?(({})=>{{return`", self.subject, self.binding)
    }

    fn or_else(&mut self) -> Result<String, ElseRejection> {
        if self.has_else {
            return Err(ElseRejection::Repeated);
        }
        self.has_else = true;
        Ok(format!("`}})({}):`", self.subject))
    }

    fn end(self) -> String {
        if self.has_else {
            "`}".to_string()
        } else {
            format!("`}})({}):``}}", self.subject)
        }
    }
}

// ---------------------------------------------------------------------------
// template
// ---------------------------------------------------------------------------

/// Inline render of a previously defined unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub registry: String,
    pub name: String,
    pub context: Option<String>,
}

impl Template {
    /// Build from the directive's arguments: a name, then an optional context
    /// operand. Further operands are ignored.
    pub fn parse<S: AsRef<str>>(registry: impl Into<String>, args: &[S], current: Binding) -> Self {
        let mut operands = args.iter().map(|t| resolve_operand(t.as_ref(), current));
        Template {
            registry: registry.into(),
            name: operands.next().unwrap_or_default(),
            context: operands.next(),
        }
    }

    fn start(&self) -> String {
        match &self.context {
            Some(context) => format!("${{{}.render({},{})}}", self.registry, self.name, context),
            None => format!("${{{}.render({})}}", self.registry, self.name),
        }
    }
}


pub mod error;

use std::ops::Range as Span;

use log::{debug, trace};

use crate::block::{BlockNode, Define, ElseRejection, Range, Template, With};
use crate::command::Command;
use crate::pipeline::Pipeline;
use crate::resolver::{Binding, resolve_bare, resolve_operands};
use crate::scanner::{DirectiveSpan, scan};

pub use error::{CompileError, Warning};

/// Settings that shape the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Runtime object that `define` registers with and `template` renders
    /// through.
    pub registry: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            registry: "customComponents".to_string(),
        }
    }
}

/// Output of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub output: String,
    pub warnings: Vec<Warning>,
}

/// Compilation state for a single document.
///
/// The block stack lives here and nowhere else. `compile` consumes the
/// compiler, so every document gets a fresh stack.
pub struct Compiler {
    options: CompileOptions,
    /// Open blocks, innermost last.
    stack: Vec<OpenBlock>,
    warnings: Vec<Warning>,
}

struct OpenBlock {
    node: BlockNode,
    span: Span<usize>,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            options,
            stack: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Replace every directive in `text` with its generated fragment. Bytes
    /// outside directives are copied unchanged.
    pub fn compile(mut self, text: &str) -> Result<Compiled, CompileError> {
        let mut output = String::with_capacity(text.len() * 2);
        let mut cursor = 0;

        for directive in scan(text) {
            output.push_str(&text[cursor..directive.start]);
            output.push_str(&self.render(&directive)?);
            cursor = directive.end;
        }
        output.push_str(&text[cursor..]);

        let warnings = self.finish()?;
        Ok(Compiled { output, warnings })
    }

    /// Generate the fragment for one directive, updating the block stack.
    pub fn render(&mut self, directive: &DirectiveSpan<'_>) -> Result<String, CompileError> {
        let span = directive.span();
        let pipeline = Pipeline::parse(directive.inner)
            .ok_or_else(|| CompileError::MalformedDirective { span: span.clone() })?;
        let current = self.current_binding();
        trace!("directive `{}` at {:?}", pipeline.text(), span);

        let fragment = match Command::classify(&pipeline) {
            Command::Define(args) => {
                let name = resolve_operands(args, current);
                self.open(BlockNode::Define(Define::new(&self.options.registry, name)), span)
            }
            Command::With(args) => {
                let subject = resolve_operands(args, current);
                self.open(BlockNode::With(With::new(subject, current.child())), span)
            }
            Command::Range(args) => self.open(BlockNode::Range(Range::parse(args, current)), span),
            Command::Template(args) => {
                BlockNode::Template(Template::parse(&self.options.registry, args, current)).start()
            }
            Command::Else => self.or_else(span)?,
            Command::End => self.close(span)?,
            Command::Bare(head) => match resolve_bare(head, current) {
                Some(expr) => format!("${{{expr}}}"),
                None => {
                    debug!("no substitution for `{}` at {:?}", pipeline.text(), span);
                    self.warnings.push(Warning::new(
                        format!("`{}` is not a recognised expression; nothing emitted", head),
                        span,
                    ));
                    String::new()
                }
            },
        };

        Ok(fragment)
    }

    /// Queue a call descriptor on the innermost open `define`. Returns the
    /// expression referring to its result, or `None` outside any `define`.
    pub fn defer(&mut self, call: impl Into<String>) -> Option<String> {
        let call = call.into();
        let define = self.stack.iter_mut().rev().find_map(|open| match &mut open.node {
            BlockNode::Define(define) => Some(define),
            _ => None,
        })?;
        Some(define.defer(call))
    }

    /// Number of blocks currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// End of document: every block must have been closed.
    pub fn finish(mut self) -> Result<Vec<Warning>, CompileError> {
        match self.stack.pop() {
            Some(open) => Err(CompileError::UnterminatedBlock {
                kind: open.node.kind(),
                span: open.span,
            }),
            None => Ok(self.warnings),
        }
    }

    /// The binding `.` resolves to at the current position.
    fn current_binding(&self) -> Binding {
        self.stack
            .iter()
            .rev()
            .find_map(|open| open.node.binding())
            .unwrap_or(Binding::BASE)
    }

    fn open(&mut self, node: BlockNode, span: Span<usize>) -> String {
        let fragment = node.start();
        debug!("open `{}` at depth {}", node.kind(), self.stack.len());
        self.stack.push(OpenBlock { node, span });
        fragment
    }

    fn or_else(&mut self, span: Span<usize>) -> Result<String, CompileError> {
        let Some(open) = self.stack.last_mut() else {
            return Err(CompileError::MisplacedElse { span });
        };
        let kind = open.node.kind();
        open.node.or_else().map_err(|rejection| match rejection {
            ElseRejection::Unsupported => CompileError::MisplacedElse { span },
            ElseRejection::Repeated => CompileError::DuplicateElse { kind, span },
        })
    }

    fn close(&mut self, span: Span<usize>) -> Result<String, CompileError> {
        let open = self
            .stack
            .pop()
            .ok_or(CompileError::UnbalancedEnd { span })?;
        let kind = open.node.kind();
        debug!("close `{}` at depth {}", kind, self.stack.len());
        Ok(open.node.end())
    }
}

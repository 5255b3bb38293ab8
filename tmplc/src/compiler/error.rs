use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

use crate::block::BlockKind;

/// Errors that abort the compile of a document. Every variant carries the
/// byte span of the offending directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("directive contains no command")]
    MalformedDirective { span: Range<usize> },

    #[error("`end` has no open block to close")]
    UnbalancedEnd { span: Range<usize> },

    #[error("`{kind}` block is never closed")]
    UnterminatedBlock { kind: BlockKind, span: Range<usize> },

    #[error("`else` outside of a `with` or `range` block")]
    MisplacedElse { span: Range<usize> },

    #[error("`{kind}` block already has an `else` branch")]
    DuplicateElse { kind: BlockKind, span: Range<usize> },
}

impl CompileError {
    pub fn span(&self) -> Range<usize> {
        match self {
            CompileError::MalformedDirective { span }
            | CompileError::UnbalancedEnd { span }
            | CompileError::UnterminatedBlock { span, .. }
            | CompileError::MisplacedElse { span }
            | CompileError::DuplicateElse { span, .. } => span.clone(),
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let label = match self {
            CompileError::MalformedDirective { .. } => "empty after comments are removed",
            CompileError::UnbalancedEnd { .. } => "unexpected `end`",
            CompileError::UnterminatedBlock { .. } => "opened here",
            CompileError::MisplacedElse { .. } => "unexpected `else`",
            CompileError::DuplicateElse { .. } => "second `else`",
        };
        let mut diagnostic = Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![
                Label::primary(file_id, self.span()).with_message(label),
            ]);
        if let CompileError::UnterminatedBlock { .. } = self {
            diagnostic = diagnostic.with_notes(vec!["add a matching `{{end}}`".to_string()]);
        }
        diagnostic
    }
}

/// A non-fatal finding. The directive it points to produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub span: Range<usize>,
}

impl Warning {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Warning {
            message: message.into(),
            span,
        }
    }

    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(file_id, self.span.clone())])
    }
}

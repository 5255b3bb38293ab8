use crate::block::ElseRejection;
use crate::resolver::{Binding, resolve_operands};

/// Loop variables declared with `range $i, $v := PATH` or `range $v := PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopVars {
    pub index: Option<String>,
    pub value: Option<String>,
}

impl LoopVars {
    /// The mapped closure's parameter list: value first, then index.
    pub fn params(&self) -> String {
        match (&self.value, &self.index) {
            (Some(value), Some(index)) => format!("{value},{index}"),
            (Some(value), None) => value.clone(),
            (None, _) => String::new(),
        }
    }
}

/// Iteration over `subject`, joining each element's output.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    /// Resolved against the enclosing level.
    pub subject: String,
    pub vars: LoopVars,
    has_else: bool,
}

impl Range {
    /// Split the directive arguments on `:=`. Without exactly one `:=` the
    /// whole argument list is the subject and no variables are bound. Left of
    /// it, one name binds the value and two comma-separated names bind index
    /// and value.
    pub fn parse<S: AsRef<str>>(args: &[S], current: Binding) -> Self {
        let raw = args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        let parts: Vec<&str> = raw.split(":=").collect();

        let (subject, vars) = match parts.as_slice() {
            [declared, subject] => (*subject, parse_vars(declared)),
            _ => (raw.as_str(), LoopVars::default()),
        };

        let operands: Vec<&str> = subject.split(' ').filter(|t| !t.is_empty()).collect();
        Range {
            subject: resolve_operands(&operands, current),
            vars,
            has_else: false,
        }
    }

    pub(super) fn start(&self) -> String {
        let subject = &self.subject;
        format!(
            "${{{subject} && {subject}.length>0 ? {subject}.map(({})=>`",
            self.vars.params()
        )
    }

    pub(super) fn or_else(&mut self) -> Result<String, ElseRejection> {
        if self.has_else {
            return Err(ElseRejection::Repeated);
        }
        self.has_else = true;
        Ok("`).join(''):`".to_string())
    }

    pub(super) fn end(self) -> String {
        if self.has_else {
            "`}".to_string()
        } else {
            "`).join(''):``}".to_string()
        }
    }
}

fn parse_vars(declared: &str) -> LoopVars {
    let names: Vec<&str> = declared.split(',').map(str::trim).collect();
    let named = |s: &str| (!s.is_empty()).then(|| s.to_string());
    match names.as_slice() {
        [index, value] => LoopVars {
            index: named(*index),
            value: named(*value),
        },
        [value, ..] => LoopVars {
            index: None,
            value: named(*value),
        },
        [] => LoopVars::default(),
    }
}

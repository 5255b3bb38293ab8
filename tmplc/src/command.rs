use crate::pipeline::Pipeline;

/// What a directive asks the compiler to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'p> {
    /// `define NAME`
    Define(&'p [String]),
    /// `with PATH`
    With(&'p [String]),
    /// `range [[INDEX,] VALUE :=] PATH`
    Range(&'p [String]),
    /// `template NAME [CONTEXT]`
    Template(&'p [String]),
    Else,
    End,
    /// Anything else: a value substitution keyed on its first token.
    Bare(&'p str),
}

impl<'p> Command<'p> {
    pub fn classify(pipeline: &'p Pipeline) -> Command<'p> {
        let args = pipeline.args();
        match pipeline.head() {
            "define" => Command::Define(args),
            "with" => Command::With(args),
            "range" => Command::Range(args),
            "template" => Command::Template(args),
            "else" => Command::Else,
            "end" => Command::End,
            head => Command::Bare(head),
        }
    }
}

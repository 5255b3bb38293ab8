pub mod block;
pub mod command;
pub mod compiler;
pub mod pipeline;
pub mod resolver;
pub mod scanner;

pub use compiler::{CompileError, CompileOptions, Compiled, Compiler, Warning};

/// Compile one document with the default options.
pub fn compile(text: &str) -> Result<Compiled, CompileError> {
    Compiler::new(CompileOptions::default()).compile(text)
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tmplc::CompileError;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings '{}': {message}", path.display())]
    Settings { path: PathBuf, message: String },

    /// A template failed to compile. `text` is the preprocessed document the
    /// error's span points into.
    #[error("{}: {error}", path.display())]
    Compile {
        path: PathBuf,
        text: String,
        #[source]
        error: CompileError,
    },

    #[error("cannot serialize page context: {0}")]
    Context(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The tree/table document could not be loaded.
    #[error("Input error: {msg}")]
    Input { msg: String },

    /// An `Unresolved` type reached a code generation decision. The validator
    /// upstream should have rejected the program.
    #[error("Unresolvable type in codegen: {what}")]
    UnresolvedType { what: String, span: Span },

    /// A construct with no lowering rule. Aborts the whole class.
    #[error("Unsupported construct: {construct}")]
    Unsupported { construct: String, span: Span },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("Emit error: {msg}")]
    Emit { msg: String },
}

impl CompileError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input { msg: msg.into() }
    }

    pub fn unresolved(what: impl Into<String>, span: Span) -> Self {
        Self::UnresolvedType { what: what.into(), span }
    }

    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        Self::Unsupported { construct: construct.into(), span }
    }

    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    pub fn emit(msg: impl Into<String>) -> Self {
        Self::Emit { msg: msg.into() }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::UnresolvedType { span, .. } | CompileError::Unsupported { span, .. } => Some(*span),
            _ => None,
        }
    }
}

/// Print a CompileError to stderr.
pub fn render_error(filename: &str, err: &CompileError) {
    match err {
        CompileError::UnresolvedType { span, .. } => {
            eprintln!("error[unresolved-type]: {err}");
            eprintln!("  --> {filename}:{span}");
        }
        CompileError::Unsupported { span, .. } => {
            eprintln!("error[unsupported]: {err}");
            eprintln!("  --> {filename}:{span}");
        }
        CompileError::Input { msg } => {
            eprintln!("error[input]: {msg}");
            eprintln!("  --> {filename}");
        }
        CompileError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        CompileError::Emit { msg } => {
            eprintln!("error: {msg}");
        }
    }
}

//! Layered error type for the elaborator: a typed cause plus an accumulated
//! trail of the pass/module/instance context it unwound through.

use arcstr::ArcStr;
use std::fmt;

/// Elaboration result alias, used throughout the crate in place of a bare `Result`.
pub type Result<T> = std::result::Result<T, Error>;

/// The taxonomy of ways elaboration can fail. Each variant names the
/// offending entity directly where one is available; caller-visible
/// context (which pass, which module) is attached separately via
/// [`Error::context`].
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("expected a module, got something else")]
    TypeMismatch,

    #[error("port `{port}` is undefined on instance `{instance}`")]
    UndefinedReference { instance: ArcStr, port: ArcStr },

    #[error("module reached during elaboration has no name")]
    AnonymousModule,

    #[error("shorting detected among {0:?}")]
    Shorting(Vec<(ArcStr, ArcStr)>),

    #[error("cannot produce a name for `{candidate}` under the length limit")]
    NameExhaustion { candidate: String },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// A single frame of "while doing X" context, pushed as an error unwinds.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ErrorContext {
    Pass(&'static str),
    Module(ArcStr),
    Instance(ArcStr),
    Generator(ArcStr),
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Pass(name) => write!(f, "running pass `{name}`"),
            ErrorContext::Module(name) => write!(f, "elaborating module `{name}`"),
            ErrorContext::Instance(name) => write!(f, "elaborating instance `{name}`"),
            ErrorContext::Generator(name) => write!(f, "invoking generator `{name}`"),
        }
    }
}

/// An [`ErrorKind`] plus the context trail accumulated while it propagated.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    context: Vec<ErrorContext>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    /// Pushes one more "while doing X" frame, innermost first.
    pub fn context(mut self, ctx: ErrorContext) -> Self {
        self.context.push(ctx);
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for ctx in &self.context {
            write!(f, "\n  while {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Runs `f`, tagging any error it returns with one more context frame.
pub fn with_context<T>(result: Result<T>, ctx: impl FnOnce() -> ErrorContext) -> Result<T> {
    result.map_err(|e| e.context(ctx()))
}

//! Root error type for AssistantMD engine operations.
//!
//! Mirrors the teacher's two-tier design: each submodule owns a
//! `thiserror`-derived error enum describing its own failure modes; this
//! type wraps each of those (plus `io::Error`) and classifies them for the
//! orchestrator (step-fatal vs. run-fatal vs. fail-open), per `spec.md` §7.

use std::error::Error;
use std::fmt::{self, Display};
use std::io;

use crate::domain::directive::DirectiveError;
use crate::domain::pattern::PatternError;
use crate::domain::scheduler::TriggerError;
use crate::domain::workflow::WorkflowParseError;

/// Engine-wide error type.
#[derive(Debug)]
pub enum AppError {
    /// Underlying I/O failure.
    Io(io::Error),
    /// Invalid identifier (vault id, workflow id, buffer name, session id).
    InvalidIdentifier(String),
    /// Missing or invalid settings, missing secrets, unknown model alias.
    ConfigurationError(String),
    /// A required secret is absent for the named provider/tool.
    MissingSecret { alias: String, secret: String },
    /// Malformed directive or unknown scheme.
    DirectiveParse(DirectiveError),
    /// Rejected pattern (`..`, `**`, absolute paths) or resolution failure.
    PatternResolution(PatternError),
    /// Invalid crontab or past one-time datetime.
    Trigger(TriggerError),
    /// Frontmatter/section parsing failure.
    WorkflowParse(WorkflowParseError),
    /// LLM invocation failure (timeout, provider error).
    Llm(String),
    /// Persistence failure (job store, file-state store, context store).
    Store(String),
    /// Vault or workflow not found.
    NotFound(String),
    /// A resolved path escaped its repository/vault root.
    PathTraversal(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "{err}"),
            AppError::InvalidIdentifier(id) => write!(f, "invalid identifier: '{id}'"),
            AppError::ConfigurationError(message) => write!(f, "{message}"),
            AppError::MissingSecret { alias, secret } => {
                write!(f, "configure {secret} (required by model alias '{alias}')")
            }
            AppError::DirectiveParse(err) => write!(f, "{err}"),
            AppError::PatternResolution(err) => write!(f, "{err}"),
            AppError::Trigger(err) => write!(f, "{err}"),
            AppError::WorkflowParse(err) => write!(f, "{err}"),
            AppError::Llm(message) => write!(f, "LLM error: {message}"),
            AppError::Store(message) => write!(f, "store error: {message}"),
            AppError::NotFound(what) => write!(f, "not found: {what}"),
            AppError::PathTraversal(path) => write!(f, "path escapes its root: '{path}'"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::DirectiveParse(err) => Some(err),
            AppError::PatternResolution(err) => Some(err),
            AppError::Trigger(err) => Some(err),
            AppError::WorkflowParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(value: io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<DirectiveError> for AppError {
    fn from(value: DirectiveError) -> Self {
        AppError::DirectiveParse(value)
    }
}

impl From<PatternError> for AppError {
    fn from(value: PatternError) -> Self {
        AppError::PatternResolution(value)
    }
}

impl From<TriggerError> for AppError {
    fn from(value: TriggerError) -> Self {
        AppError::Trigger(value)
    }
}

impl From<WorkflowParseError> for AppError {
    fn from(value: WorkflowParseError) -> Self {
        AppError::WorkflowParse(value)
    }
}

/// Classification of a failure's blast radius, used by the step engine and
/// context manager to decide whether to abort the step, the run, or to
/// fail open (per `spec.md` §7 propagation rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fails only the enclosing step; the run continues.
    StepFatal,
    /// Fails the whole run (orchestrator-level failure).
    RunFatal,
    /// Logged and ignored; caller proceeds with a degraded fallback.
    FailOpen,
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::ConfigurationError(message.into())
    }

    /// Classify this error's blast radius for the orchestrator.
    pub fn severity(&self) -> Severity {
        match self {
            AppError::DirectiveParse(_)
            | AppError::PatternResolution(_)
            | AppError::Llm(_)
            | AppError::MissingSecret { .. }
            | AppError::ConfigurationError(_) => Severity::StepFatal,
            AppError::Io(_) | AppError::Store(_) | AppError::NotFound(_) | AppError::PathTraversal(_) => Severity::StepFatal,
            AppError::Trigger(_) | AppError::WorkflowParse(_) => Severity::RunFatal,
            AppError::InvalidIdentifier(_) => Severity::RunFatal,
        }
    }

    /// An `io::ErrorKind`-like view for callers expecting legacy behavior.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::NotFound(_) => io::ErrorKind::NotFound,
            AppError::InvalidIdentifier(_)
            | AppError::ConfigurationError(_)
            | AppError::MissingSecret { .. }
            | AppError::DirectiveParse(_)
            | AppError::PatternResolution(_)
            | AppError::Trigger(_)
            | AppError::WorkflowParse(_)
            | AppError::PathTraversal(_) => io::ErrorKind::InvalidInput,
            AppError::Llm(_) | AppError::Store(_) => io::ErrorKind::Other,
        }
    }
}

//! Errors raised while parsing a workflow `.md` file (`spec.md` §4.3).

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum WorkflowParseError {
    #[error("frontmatter delimiter '---' required but not found")]
    MissingFrontmatter,

    #[error("frontmatter is not terminated by a closing '---'")]
    UnterminatedFrontmatter,

    #[error("malformed frontmatter line '{0}': expected 'key: value'")]
    MalformedFrontmatterLine(String),

    #[error("invalid value for frontmatter key '{key}': {reason}")]
    InvalidFrontmatterValue { key: String, reason: String },

    #[error("section '{0}' declares directives that could not be parsed: {1}")]
    Directive(String, String),
}

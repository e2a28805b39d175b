//! Directive parsing errors.

#[derive(Debug, thiserror::Error, Clone)]
#[error("directive '@{directive}' in section '{section}' is malformed: {reason} (line: {raw_line:?})")]
pub struct DirectiveError {
    pub directive: String,
    pub section: String,
    pub raw_line: String,
    pub reason: String,
}

impl DirectiveError {
    pub fn new(directive: impl Into<String>, section: impl Into<String>, raw_line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            section: section.into(),
            raw_line: raw_line.into(),
            reason: reason.into(),
        }
    }
}

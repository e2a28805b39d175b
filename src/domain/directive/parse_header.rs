//! `@header <template>` — a pattern-resolved string, used only alongside `@output file:`.

use super::error::DirectiveError;

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<String, DirectiveError> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Err(DirectiveError::new("header", section, raw_line, "header template must not be empty"));
    }
    Ok(trimmed.to_string())
}

//! `@write-mode append|new|replace`

use super::error::DirectiveError;
use super::value::WriteMode;

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<WriteMode, DirectiveError> {
    match args.trim().to_ascii_lowercase().as_str() {
        "append" => Ok(WriteMode::Append),
        "new" => Ok(WriteMode::New),
        "replace" => Ok(WriteMode::Replace),
        other => Err(DirectiveError::new(
            "write-mode",
            section,
            raw_line,
            format!("unknown write-mode '{other}', expected append|new|replace"),
        )),
    }
}

//! `@tools <csv | all | none>`

use std::collections::BTreeSet;

use super::error::DirectiveError;
use super::value::ToolsDirective;

const TRUTHY: &[&str] = &["all", "true", "yes", "on", "1"];
const FALSY: &[&str] = &["none", "false", "no", "off", "0"];

pub fn parse(_section: &str, _raw_line: &str, args: &str) -> Result<ToolsDirective, DirectiveError> {
    let trimmed = args.trim();
    let lower = trimmed.to_ascii_lowercase();

    if TRUTHY.contains(&lower.as_str()) {
        return Ok(ToolsDirective::All);
    }
    if FALSY.contains(&lower.as_str()) {
        return Ok(ToolsDirective::None);
    }

    let names: BTreeSet<String> = trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    Ok(ToolsDirective::Named(names))
}

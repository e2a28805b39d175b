//! `@model <alias> [(thinking[=true])]`

use super::error::DirectiveError;
use super::parse_util::{is_truthy, parse_options, split_target_and_options};
use super::value::ModelDirective;

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<ModelDirective, DirectiveError> {
    let (alias, opts_part) = split_target_and_options(args);
    if alias.is_empty() {
        return Err(DirectiveError::new("model", section, raw_line, "alias must not be empty"));
    }

    let mut thinking = false;
    if let Some(opts) = opts_part {
        for opt in parse_options(opts) {
            match opt.key {
                "thinking" => thinking = opt.value.map(is_truthy).unwrap_or(true),
                other => {
                    return Err(DirectiveError::new(
                        "model",
                        section,
                        raw_line,
                        format!("unknown option '{other}'"),
                    ));
                }
            }
        }
    }

    Ok(ModelDirective { alias: alias.to_string(), thinking })
}

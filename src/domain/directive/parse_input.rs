//! `@input <scheme>:<target> [(required[=true], refs_only=..., images=auto|ignore)]`

use super::error::DirectiveError;
use super::parse_util::{is_truthy, parse_options, split_scheme_target, split_target_and_options};
use super::value::{ImagesMode, InputDirective, Scheme};

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<InputDirective, DirectiveError> {
    let fail = |reason: &str| {
        Err(DirectiveError::new("input", section, raw_line, reason))
    };

    let (target_part, opts_part) = split_target_and_options(args);
    let Some((scheme_str, target)) = split_scheme_target(target_part) else {
        return fail("expected '<scheme>:<target>'");
    };
    let scheme = match scheme_str {
        "file" => Scheme::File,
        "variable" => Scheme::Variable,
        other => return fail(&format!("unknown scheme '{other}', expected 'file' or 'variable'")),
    };
    if target.is_empty() {
        return fail("target must not be empty");
    }

    let mut required = false;
    let mut refs_only = false;
    let mut images = ImagesMode::Auto;

    if let Some(opts) = opts_part {
        for opt in parse_options(opts) {
            match opt.key {
                "required" => required = opt.value.map(is_truthy).unwrap_or(true),
                "refs_only" => refs_only = opt.value.map(is_truthy).unwrap_or(true),
                "images" => {
                    images = match opt.value {
                        Some("ignore") => ImagesMode::Ignore,
                        Some("auto") | None => ImagesMode::Auto,
                        Some(other) => {
                            return fail(&format!("unknown images mode '{other}'"));
                        }
                    }
                }
                other => return fail(&format!("unknown option '{other}'")),
            }
        }
    }

    Ok(InputDirective { scheme, target: target.to_string(), refs_only, required, images })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_input_with_options() {
        let v = parse("s", "@input file:{pending:3} (required)", "file:{pending:3} (required)")
            .unwrap();
        assert_eq!(v.scheme, Scheme::File);
        assert!(v.required);
        assert!(!v.refs_only);
    }

    #[test]
    fn parses_variable_input() {
        let v = parse("s", "@input variable:summary", "variable:summary").unwrap();
        assert_eq!(v.scheme, Scheme::Variable);
        assert_eq!(v.target, "summary");
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = parse("s", "@input http:x", "http:x").unwrap_err();
        assert!(err.reason.contains("unknown scheme"));
    }
}

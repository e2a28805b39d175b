//! `@output <scheme>:<target>`

use super::error::DirectiveError;
use super::parse_util::split_scheme_target;
use super::value::{OutputDirective, Scheme};

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<OutputDirective, DirectiveError> {
    let fail = |reason: &str| Err(DirectiveError::new("output", section, raw_line, reason));

    let Some((scheme_str, target)) = split_scheme_target(args.trim()) else {
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

    let target = strip_obsidian_brackets(target);
    Ok(OutputDirective { scheme, target })
}

/// Strip Obsidian `[[...]]` wiki-link brackets, keeping the inner text.
fn strip_obsidian_brackets(target: &str) -> String {
    target.replace("[[", "").replace("]]", "")
}

/// Normalize a resolved file output path to have exactly one `.md` suffix.
///
/// `spec.md` §4.2 / §8 invariant 2: auto-appends `.md` if missing; any other
/// extension is replaced with `.md` rather than rejected outright.
pub fn normalize_md_extension(resolved_path: &str) -> String {
    if let Some(stripped) = resolved_path.strip_suffix(".md") {
        return format!("{stripped}.md");
    }
    let last_segment = resolved_path.rsplit('/').next().unwrap_or(resolved_path);
    match last_segment.rfind('.') {
        Some(dot) if dot > 0 => {
            let base_len = resolved_path.len() - (last_segment.len() - dot);
            format!("{}.md", &resolved_path[..base_len])
        }
        _ => format!("{resolved_path}.md"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_brackets() {
        let v = parse("s", "@output file:[[daily/{today}]]", "file:[[daily/{today}]]").unwrap();
        assert_eq!(v.target, "daily/{today}");
    }

    #[test]
    fn normalize_appends_md_when_missing() {
        assert_eq!(normalize_md_extension("daily/2026-02-10"), "daily/2026-02-10.md");
    }

    #[test]
    fn normalize_keeps_single_md() {
        assert_eq!(normalize_md_extension("daily/2026-02-10.md"), "daily/2026-02-10.md");
    }

    #[test]
    fn normalize_replaces_other_extension() {
        assert_eq!(normalize_md_extension("daily/notes.txt"), "daily/notes.md");
    }
}

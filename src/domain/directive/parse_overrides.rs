//! `@recent-runs N` / `@recent-summaries N` / `@token-threshold N` / `@passthrough-runs N|all`

use super::error::DirectiveError;
use super::value::PassthroughRuns;

pub fn parse_non_negative_int(name: &str, section: &str, raw_line: &str, args: &str) -> Result<u32, DirectiveError> {
    args.trim().parse::<u32>().map_err(|_| {
        DirectiveError::new(name, section, raw_line, format!("expected a non-negative integer, got '{}'", args.trim()))
    })
}

pub fn parse_passthrough_runs(section: &str, raw_line: &str, args: &str) -> Result<PassthroughRuns, DirectiveError> {
    let trimmed = args.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(PassthroughRuns::All);
    }
    trimmed
        .parse::<u32>()
        .map(PassthroughRuns::N)
        .map_err(|_| DirectiveError::new("passthrough-runs", section, raw_line, format!("expected 'all' or a non-negative integer, got '{trimmed}'")))
}

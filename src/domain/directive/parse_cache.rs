//! `@cache <duration>` — `N{s|m|h|d}`, `session`, `daily`, or `weekly`.

use super::error::DirectiveError;
use super::value::CacheDirective;

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<CacheDirective, DirectiveError> {
    let trimmed = args.trim().to_ascii_lowercase();
    match trimmed.as_str() {
        "session" => return Ok(CacheDirective::Session),
        "daily" => return Ok(CacheDirective::Daily),
        "weekly" => return Ok(CacheDirective::Weekly),
        _ => {}
    }

    let fail = || {
        DirectiveError::new(
            "cache",
            section,
            raw_line,
            format!("invalid duration '{trimmed}', expected N{{s|m|h|d}}, session, daily, or weekly"),
        )
    };

    if trimmed.is_empty() {
        return Err(fail());
    }
    let (digits, unit) = trimmed.split_at(trimmed.len() - 1);
    let n: u64 = digits.parse().map_err(|_| fail())?;
    let seconds = match unit {
        "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        "d" => n * 86400,
        _ => return Err(fail()),
    };
    Ok(CacheDirective::TtlSeconds(seconds))
}

//! `@run-on` — weekday set, `daily` (default), or `never`.

use chrono::Weekday;

use super::error::DirectiveError;
use super::value::{DaySet, RunOnDirective};

fn weekday_from_name(name: &str) -> Option<Weekday> {
    Some(match name.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    })
}

pub fn parse(section: &str, raw_line: &str, args: &str) -> Result<RunOnDirective, DirectiveError> {
    let trimmed = args.trim().to_ascii_lowercase();
    if trimmed.is_empty() || trimmed == "daily" {
        return Ok(RunOnDirective::Daily);
    }
    if trimmed == "never" {
        return Ok(RunOnDirective::Never);
    }

    let mut days = DaySet::default();
    for token in trimmed.split(|c: char| c == ',' || c.is_whitespace()).map(str::trim).filter(|s| !s.is_empty()) {
        let Some(day) = weekday_from_name(token) else {
            return Err(DirectiveError::new(
                "run-on",
                section,
                raw_line,
                format!("unknown weekday '{token}'"),
            ));
        };
        days.insert(day);
    }
    Ok(RunOnDirective::Days(days))
}

/// Whether this run-on spec matches the given day of week.
pub fn matches(spec: RunOnDirective, day: Weekday) -> bool {
    match spec {
        RunOnDirective::Daily => true,
        RunOnDirective::Never => false,
        RunOnDirective::Days(set) => set.contains(day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_daily() {
        assert_eq!(parse("s", "@run-on", "").unwrap(), RunOnDirective::Daily);
    }

    #[test]
    fn never_never_matches() {
        let spec = parse("s", "@run-on never", "never").unwrap();
        assert!(!matches(spec, Weekday::Mon));
    }

    #[test]
    fn parses_abbreviated_weekday_list() {
        let spec = parse("s", "@run-on mon,tue,wed,thu,fri", "mon,tue,wed,thu,fri").unwrap();
        assert!(matches(spec, Weekday::Mon));
        assert!(!matches(spec, Weekday::Sat));
    }
}

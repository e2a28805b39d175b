//! `{...}` pattern resolution against a reference date and vault contents.

use chrono::NaiveDate;

use super::error::PatternError;
use super::lookup::{VaultDirLookup, VaultFileMeta};
use super::tokens::{self, WeekStart, DEFAULT_DATE_FORMAT, DEFAULT_MONTH_FORMAT};

const DEFAULT_PENDING_LIMIT: usize = 10;
const DEFAULT_LATEST_CAP: usize = 50;

/// A caller-supplied filter narrowing file-collection candidates down to
/// the ones not yet recorded as processed for a given `{pending}` site.
/// The step engine implements this over `ports::FileStateStore`.
pub trait PendingFilter {
    fn filter_unprocessed(&self, candidates: Vec<VaultFileMeta>) -> Vec<VaultFileMeta>;
}

/// Resolve a pattern that may reference file collections (`{latest}`,
/// `{pending}`) or a glob, returning an ordered list of vault-relative
/// paths. Non-recursive within the directory context of the pattern.
pub fn resolve_many(
    pattern: &str,
    ref_date: NaiveDate,
    week_start: WeekStart,
    lookup: &dyn VaultDirLookup,
    pending_filter: Option<&dyn PendingFilter>,
) -> Result<Vec<String>, PatternError> {
    validate_pattern_safety(pattern)?;

    let (dir, last_segment) = split_last_segment(pattern);

    if let Some(token) = parse_collection_token(last_segment) {
        let dir_resolved = resolve_literal_prefix(dir, ref_date, week_start)?;
        let mut candidates = lookup.list_dir(&dir_resolved)?;
        candidates.sort_by(|a, b| a.modified.cmp(&b.modified));

        return Ok(match token {
            CollectionToken::Latest(n) => {
                let limit = n.unwrap_or(DEFAULT_LATEST_CAP).min(DEFAULT_LATEST_CAP);
                let mut by_created = candidates;
                by_created.sort_by(|a, b| {
                    b.created.cmp(&a.created).then_with(|| b.modified.cmp(&a.modified))
                });
                by_created.into_iter().take(limit).map(|f| f.relative_path).collect()
            }
            CollectionToken::Pending(n) => {
                let limit = n.unwrap_or(DEFAULT_PENDING_LIMIT);
                let filtered = match pending_filter {
                    Some(filter) => filter.filter_unprocessed(candidates),
                    None => candidates,
                };
                filtered.into_iter().take(limit).map(|f| f.relative_path).collect()
            }
        });
    }

    if last_segment.contains('*') {
        let dir_resolved = resolve_literal_prefix(dir, ref_date, week_start)?;
        let candidates = lookup.list_dir(&dir_resolved)?;
        let mut matched: Vec<VaultFileMeta> = candidates
            .into_iter()
            .filter(|f| {
                let name = f.relative_path.rsplit('/').next().unwrap_or(&f.relative_path);
                glob_match(last_segment, name)
            })
            .collect();
        matched.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        return Ok(matched.into_iter().map(|f| f.relative_path).collect());
    }

    // Plain literal (possibly with date tokens): a single file reference.
    let resolved = resolve_single(pattern, ref_date, week_start)?;
    if lookup.file_exists(&resolved) {
        Ok(vec![resolved])
    } else {
        Ok(Vec::new())
    }
}

/// Resolve the directory prefix a file-collection pattern scans, after
/// substituting any date tokens in it. Lets callers fetch that directory's
/// listing themselves before invoking `resolve_many` with a pre-fetched
/// `VaultDirLookup` (e.g. an async `VaultRepository` adapter cannot satisfy
/// `resolve_many`'s synchronous lookup trait directly).
pub fn resolve_dir_prefix(pattern: &str, ref_date: NaiveDate, week_start: WeekStart) -> Result<String, PatternError> {
    validate_pattern_safety(pattern)?;
    let (dir, _) = split_last_segment(pattern);
    resolve_literal_prefix(dir, ref_date, week_start)
}

/// Resolve a pattern that resolves to exactly one string (for output paths
/// and header templates); rejects file-collection tokens.
pub fn resolve_single(
    pattern: &str,
    ref_date: NaiveDate,
    week_start: WeekStart,
) -> Result<String, PatternError> {
    validate_pattern_safety(pattern)?;
    substitute_date_tokens(pattern, ref_date, week_start)
}

fn validate_pattern_safety(pattern: &str) -> Result<(), PatternError> {
    if pattern.starts_with('/') || pattern.contains("..") || pattern.contains("**") {
        return Err(PatternError::UnsafePattern(pattern.to_string()));
    }
    Ok(())
}

fn split_last_segment(pattern: &str) -> (&str, &str) {
    match pattern.rfind('/') {
        Some(idx) => (&pattern[..idx], &pattern[idx + 1..]),
        None => ("", pattern),
    }
}

fn resolve_literal_prefix(
    dir: &str,
    ref_date: NaiveDate,
    week_start: WeekStart,
) -> Result<String, PatternError> {
    if dir.is_empty() {
        return Ok(String::new());
    }
    substitute_date_tokens(dir, ref_date, week_start)
}

enum CollectionToken {
    Latest(Option<usize>),
    Pending(Option<usize>),
}

fn parse_collection_token(segment: &str) -> Option<CollectionToken> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    let (name, count) = match inner.split_once(':') {
        Some((n, c)) => (n, Some(c)),
        None => (inner, None),
    };
    let count = match count {
        Some(c) => Some(c.parse::<usize>().ok()?),
        None => None,
    };
    match name {
        "latest" => Some(CollectionToken::Latest(count)),
        "pending" => Some(CollectionToken::Pending(count)),
        _ => None,
    }
}

/// Match a single-segment glob pattern (`*` wildcard only, no `**`).
fn glob_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }
    let mut pos = 0usize;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !name[pos..].starts_with(part) {
                return false;
            }
            pos += part.len();
        } else if i == parts.len() - 1 {
            if !name[pos..].ends_with(part) {
                return false;
            }
        } else {
            match name[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
    }
    true
}

/// Recognized date token names mapped to (date, default format).
fn substitute_date_tokens(
    input: &str,
    ref_date: NaiveDate,
    week_start: WeekStart,
) -> Result<String, PatternError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let token_body = &after_open[..close];
        let (name, format) = match token_body.split_once(':') {
            Some((n, f)) => (n, Some(f)),
            None => (token_body, None),
        };

        if let Some(resolved) = resolve_date_token(name, format, ref_date, week_start)? {
            out.push_str(&resolved);
        } else {
            // Not a recognized date token (e.g. a file-collection token
            // embedded mid-string, or unknown) — surface as an error, since
            // resolve_single/resolve_literal_prefix only deal in date tokens.
            return Err(PatternError::UnknownToken(token_body.to_string()));
        }

        rest = &after_open[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_date_token(
    name: &str,
    format: Option<&str>,
    ref_date: NaiveDate,
    week_start_day: WeekStart,
) -> Result<Option<String>, PatternError> {
    use chrono::Duration;

    let (date, default_fmt, name_only): (NaiveDate, &str, bool) = match name {
        "today" => (ref_date, DEFAULT_DATE_FORMAT, false),
        "yesterday" => (ref_date - Duration::days(1), DEFAULT_DATE_FORMAT, false),
        "tomorrow" => (ref_date + Duration::days(1), DEFAULT_DATE_FORMAT, false),
        "this-week" => (tokens::week_start(ref_date, week_start_day, 0), DEFAULT_DATE_FORMAT, false),
        "last-week" => (tokens::week_start(ref_date, week_start_day, -1), DEFAULT_DATE_FORMAT, false),
        "next-week" => (tokens::week_start(ref_date, week_start_day, 1), DEFAULT_DATE_FORMAT, false),
        "this-month" => (tokens::month_start(ref_date, 0), DEFAULT_MONTH_FORMAT, false),
        "last-month" => (tokens::month_start(ref_date, -1), DEFAULT_MONTH_FORMAT, false),
        "day-name" => (ref_date, "dddd", true),
        "month-name" => (ref_date, "MMMM", true),
        _ => return Ok(None),
    };

    let fmt = format.unwrap_or(default_fmt);
    if name_only && format.is_none() {
        return Ok(Some(tokens::format_date(date, default_fmt)));
    }
    Ok(Some(tokens::format_date(date, fmt)))
}

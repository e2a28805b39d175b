//! Shared parsing helpers for directive argument strings.

/// Split `"scheme:target (opts)"` into the `scheme:target` part and an
/// optional parenthesized options string.
pub fn split_target_and_options(args: &str) -> (&str, Option<&str>) {
    let args = args.trim();
    match args.find('(') {
        Some(idx) => {
            let target = args[..idx].trim();
            let rest = args[idx + 1..].trim_end();
            let opts = rest.strip_suffix(')').unwrap_or(rest).trim();
            (target, Some(opts))
        }
        None => (args, None),
    }
}

/// Split `"scheme:target"` into `(scheme, target)`.
pub fn split_scheme_target(target: &str) -> Option<(&str, &str)> {
    target.split_once(':').map(|(a, b)| (a.trim(), b.trim()))
}

/// A parsed `key` or `key=value` option token.
pub struct Opt<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

/// Parse a comma/space-separated options string into key[=value] tokens.
pub fn parse_options(opts: &str) -> Vec<Opt<'_>> {
    opts.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|token| match token.split_once('=') {
            Some((k, v)) => Opt { key: k.trim(), value: Some(v.trim()) },
            None => Opt { key: token, value: None },
        })
        .collect()
}

/// Truthy flag values, per `spec.md` §4.2 `@tools` reserved words.
pub fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1")
}

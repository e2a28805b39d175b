//! Directive block tokenizer + per-directive dispatch (`spec.md` §4.2).
//!
//! Directives occupy a contiguous prefix of a section body; the first line
//! that does not start with `@` (including a blank line) terminates the
//! block (`spec.md` §8 invariant 1).

use super::error::DirectiveError;
use super::value::{
    CacheDirective, ModelDirective, OutputDirective, PassthroughRuns, RunOnDirective, ToolsDirective,
    WriteMode,
};
use super::{parse_cache, parse_header, parse_input, parse_model, parse_output, parse_overrides, parse_run_on, parse_tools, parse_write_mode};
use super::value::InputDirective;

/// All directives parsed out of one section, plus the remaining prompt body.
#[derive(Debug, Clone, Default)]
pub struct DirectiveMap {
    pub inputs: Vec<InputDirective>,
    pub output: Option<OutputDirective>,
    pub header: Option<String>,
    pub model: Option<ModelDirective>,
    pub tools: Option<ToolsDirective>,
    pub write_mode: Option<WriteMode>,
    pub run_on: RunOnDirective,
    pub cache: Option<CacheDirective>,
    pub recent_runs: Option<u32>,
    pub recent_summaries: Option<u32>,
    pub token_threshold: Option<u32>,
    pub passthrough_runs: Option<PassthroughRuns>,
}

/// Split a section body into its leading directive lines and the remaining
/// prompt body text.
pub fn split_directive_block(body: &str) -> (Vec<&str>, &str) {
    let mut directive_lines = Vec::new();
    let mut offset = 0usize;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('@') {
            directive_lines.push(line);
            offset += line.len() + 1; // +1 for the newline consumed by `.lines()`
        } else {
            break;
        }
    }

    let prompt_body = if offset >= body.len() { "" } else { &body[offset.min(body.len())..] };
    (directive_lines, prompt_body.trim_start_matches('\n'))
}

/// Parse all directives for one section into a `DirectiveMap`.
pub fn parse_section_directives(section: &str, body: &str) -> Result<(DirectiveMap, String), DirectiveError> {
    let (lines, prompt_body) = split_directive_block(body);
    let mut map = DirectiveMap::default();

    for raw_line in lines {
        let trimmed = raw_line.trim();
        let Some(rest) = trimmed.strip_prefix('@') else { continue };
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest, ""),
        };

        match name {
            "input" => map.inputs.push(parse_input::parse(section, trimmed, args)?),
            "output" => map.output = Some(parse_output::parse(section, trimmed, args)?),
            "header" => map.header = Some(parse_header::parse(section, trimmed, args)?),
            "model" => map.model = Some(parse_model::parse(section, trimmed, args)?),
            "tools" => map.tools = Some(parse_tools::parse(section, trimmed, args)?),
            "write-mode" => map.write_mode = Some(parse_write_mode::parse(section, trimmed, args)?),
            "run-on" => map.run_on = parse_run_on::parse(section, trimmed, args)?,
            "cache" => map.cache = Some(parse_cache::parse(section, trimmed, args)?),
            "recent-runs" => {
                map.recent_runs = Some(parse_overrides::parse_non_negative_int("recent-runs", section, trimmed, args)?)
            }
            "recent-summaries" => {
                map.recent_summaries =
                    Some(parse_overrides::parse_non_negative_int("recent-summaries", section, trimmed, args)?)
            }
            "token-threshold" => {
                map.token_threshold =
                    Some(parse_overrides::parse_non_negative_int("token-threshold", section, trimmed, args)?)
            }
            "passthrough-runs" => {
                map.passthrough_runs = Some(parse_overrides::parse_passthrough_runs(section, trimmed, args)?)
            }
            other => {
                return Err(DirectiveError::new(
                    other,
                    section,
                    trimmed,
                    format!("unknown directive '@{other}'"),
                ));
            }
        }
    }

    Ok((map, prompt_body.to_string()))
}

//! `parse_workflow_file` — frontmatter + `##` section splitting (`spec.md` §4.3).

use std::collections::BTreeMap;

use chrono::Weekday;

use super::error::WorkflowParseError;
use super::hash::source_hash;
use super::section::{EngineKind, RawSection, ScheduleSpec, Workflow};
use crate::domain::identifiers::WorkflowGlobalId;

/// Parsed frontmatter, preserved verbatim (unknown keys kept but unused).
pub type Frontmatter = BTreeMap<String, String>;

/// `{frontmatter_map, ordered sections}`.
pub struct ParsedFile {
    pub frontmatter: Frontmatter,
    pub sections: Vec<RawSection>,
}

/// Split raw file content into frontmatter and an ordered section list.
pub fn parse_workflow_file(content: &str, require_frontmatter: bool) -> Result<ParsedFile, WorkflowParseError> {
    let normalized = content.replace("\r\n", "\n");
    let mut lines = normalized.lines().peekable();

    let frontmatter = if lines.peek().map(|l| l.trim()) == Some("---") {
        lines.next();
        let mut map = BTreeMap::new();
        let mut closed = false;
        for line in lines.by_ref() {
            if line.trim() == "---" {
                closed = true;
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = parse_frontmatter_line(line)?;
            map.insert(key, value);
        }
        if !closed {
            return Err(WorkflowParseError::UnterminatedFrontmatter);
        }
        map
    } else if require_frontmatter {
        return Err(WorkflowParseError::MissingFrontmatter);
    } else {
        BTreeMap::new()
    };

    let remainder: String = lines.collect::<Vec<_>>().join("\n");
    let sections = split_sections(&remainder);

    Ok(ParsedFile { frontmatter, sections })
}

fn parse_frontmatter_line(line: &str) -> Result<(String, String), WorkflowParseError> {
    let Some((key, value)) = line.split_once(':') else {
        return Err(WorkflowParseError::MalformedFrontmatterLine(line.to_string()));
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(WorkflowParseError::MalformedFrontmatterLine(line.to_string()));
    }
    Ok((key, strip_quotes(value.trim())))
}

fn strip_quotes(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

fn split_sections(body: &str) -> Vec<RawSection> {
    let mut sections = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_lines: Vec<&str> = Vec::new();

    for line in body.lines() {
        if let Some(name) = line.strip_prefix("## ").or_else(|| {
            let trimmed = line.trim_start();
            trimmed.strip_prefix("##").map(str::trim_start).filter(|_| trimmed.starts_with("##"))
        }) {
            if let Some(prev_name) = current_name.take() {
                sections.push(RawSection { name: prev_name, body: current_lines.join("\n") });
                current_lines = Vec::new();
            }
            current_name = Some(name.trim().to_string());
        } else if current_name.is_some() {
            current_lines.push(line);
        }
    }

    if let Some(name) = current_name {
        sections.push(RawSection { name, body: current_lines.join("\n") });
    }

    sections
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    Some(match name.to_ascii_lowercase().as_str() {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        "sunday" => Weekday::Sun,
        _ => return None,
    })
}

/// Assemble a full `Workflow` record from raw content and its global id.
pub fn build_workflow(global_id: WorkflowGlobalId, content: &str) -> Result<Workflow, WorkflowParseError> {
    let parsed = parse_workflow_file(content, true)?;

    let engine_kind = match parsed.frontmatter.get("engine").map(String::as_str) {
        Some("interactive") => EngineKind::Interactive,
        _ => EngineKind::Step,
    };

    let schedule_spec = match (parsed.frontmatter.get("cron"), parsed.frontmatter.get("once")) {
        (Some(cron), _) => ScheduleSpec::Cron(cron.clone()),
        (None, Some(once)) => ScheduleSpec::Once(once.clone()),
        (None, None) => ScheduleSpec::None,
    };

    let enabled = match parsed.frontmatter.get("enabled").map(String::as_str) {
        Some("false") => false,
        _ => true,
    };

    let week_start_day = parsed
        .frontmatter
        .get("week_start_day")
        .and_then(|v| weekday_from_name(v))
        .unwrap_or(Weekday::Mon);

    let description = parsed.frontmatter.get("description").cloned().unwrap_or_default();

    Ok(Workflow {
        global_id,
        engine_kind,
        schedule_spec,
        enabled,
        week_start_day,
        description,
        sections: parsed.sections,
        source_hash: source_hash(content),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifiers::VaultId;

    #[test]
    fn splits_frontmatter_and_sections() {
        let content = "---\ncron: \"0 9 * * *\"\ndescription: 'daily digest'\n---\n## Step One\n@input file:{today}\nDo it.\n## Step Two\nBody two.\n";
        let parsed = parse_workflow_file(content, true).unwrap();
        assert_eq!(parsed.frontmatter.get("cron").unwrap(), "0 9 * * *");
        assert_eq!(parsed.frontmatter.get("description").unwrap(), "daily digest");
        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.sections[0].name, "Step One");
        assert!(parsed.sections[1].body.contains("Body two."));
    }

    #[test]
    fn missing_frontmatter_is_an_error_when_required() {
        let err = parse_workflow_file("## Step\nbody", true).unwrap_err();
        assert!(matches!(err, WorkflowParseError::MissingFrontmatter));
    }

    #[test]
    fn treats_whole_file_as_sections_when_frontmatter_optional() {
        let parsed = parse_workflow_file("## Step\nbody", false).unwrap();
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.sections.len(), 1);
    }

    #[test]
    fn unterminated_frontmatter_is_an_error() {
        let err = parse_workflow_file("---\ncron: x\n## Step\nbody", true).unwrap_err();
        assert!(matches!(err, WorkflowParseError::UnterminatedFrontmatter));
    }

    #[test]
    fn builds_workflow_record_with_defaults() {
        let vault = VaultId::new("notes").unwrap();
        let global_id = WorkflowGlobalId::new(&vault, "Workflows/daily-digest");
        let content = "---\ncron: \"0 9 * * *\"\n---\n## Step\nbody\n";
        let workflow = build_workflow(global_id, content).unwrap();
        assert!(workflow.enabled);
        assert_eq!(workflow.week_start_day, Weekday::Mon);
        assert_eq!(workflow.sections.len(), 1);
        assert!(matches!(workflow.schedule_spec, ScheduleSpec::Cron(_)));
    }
}

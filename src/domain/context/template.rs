//! `ContextTemplate` parsing (`spec.md` §4.7).
//!
//! Reuses the workflow file splitter: a template is frontmatter-free markdown
//! with `##` sections, two of which are reserved names.

use crate::domain::workflow::{parse_workflow_file, RawSection, WorkflowParseError};

const CHAT_INSTRUCTIONS: &str = "Chat Instructions";
const CONTEXT_INSTRUCTIONS: &str = "Context Instructions";

#[derive(Debug, Clone)]
pub struct ContextTemplate {
    pub chat_instructions: Option<String>,
    pub context_instructions: Option<String>,
    pub steps: Vec<RawSection>,
    pub source_hash: String,
}

pub fn parse_context_template(content: &str) -> Result<ContextTemplate, WorkflowParseError> {
    let parsed = parse_workflow_file(content, false)?;
    let mut chat_instructions = None;
    let mut context_instructions = None;
    let mut steps = Vec::new();

    for section in parsed.sections {
        if section.name == CHAT_INSTRUCTIONS {
            chat_instructions = Some(section.body.trim().to_string());
        } else if section.name == CONTEXT_INSTRUCTIONS {
            context_instructions = Some(section.body.trim().to_string());
        } else {
            steps.push(section);
        }
    }

    Ok(ContextTemplate { chat_instructions, context_instructions, steps, source_hash: crate::domain::workflow::source_hash(content) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_reserved_sections_from_context_steps() {
        let content = "## Chat Instructions\nBe terse.\n## Context Instructions\nSummarize concisely.\n## Recent Activity\n@recent-runs 3\nSummarize recent runs.\n";
        let template = parse_context_template(content).unwrap();
        assert_eq!(template.chat_instructions.as_deref(), Some("Be terse."));
        assert_eq!(template.context_instructions.as_deref(), Some("Summarize concisely."));
        assert_eq!(template.steps.len(), 1);
        assert_eq!(template.steps[0].name, "Recent Activity");
    }

    #[test]
    fn reserved_sections_are_optional() {
        let content = "## Recent Activity\nbody\n";
        let template = parse_context_template(content).unwrap();
        assert!(template.chat_instructions.is_none());
        assert!(template.context_instructions.is_none());
        assert_eq!(template.steps.len(), 1);
    }
}
